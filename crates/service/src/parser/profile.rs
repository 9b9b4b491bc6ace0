use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::user::UserSummary;


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Social {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

impl Social {
    /// Overwrites only the links present in `other`.
    pub fn merge(&mut self, other: Social) {
        if other.youtube.is_some() { self.youtube = other.youtube; }
        if other.twitter.is_some() { self.twitter = other.twitter; }
        if other.facebook.is_some() { self.facebook = other.facebook; }
        if other.linkedin.is_some() { self.linkedin = other.linkedin; }
        if other.instagram.is_some() { self.instagram = other.instagram; }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub id: Uuid,
    pub school: String,
    pub degree: String,
    pub fieldofstudy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Profile document stored in the `profiles` table under its owner's id.
///
/// `U` is the owner reference: the raw user id when stored, or the joined
/// [`UserSummary`] when served from the read endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile<U = Uuid> {
    pub id: Uuid,
    pub user: U,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub githubusername: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub social: Social,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    pub date: DateTime<Utc>,
}

/// Profile with its owner joined in; `None` when the owner record is gone.
pub type PopulatedProfile = Profile<Option<UserSummary>>;

/// Partial profile built from a create/update request. `None` means "not supplied".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFields {
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub status: Option<String>,
    pub githubusername: Option<String>,
    pub skills: Option<Vec<String>>,
    pub social: Social,
}

impl Profile {
    pub fn create(user: Uuid, fields: ProfileFields, date: DateTime<Utc>) -> Self {
        let mut profile = Profile {
            id: Uuid::new_v4(),
            user,
            company: None,
            website: None,
            location: None,
            bio: None,
            status: String::new(),
            githubusername: None,
            skills: Vec::new(),
            social: Social::default(),
            experience: Vec::new(),
            education: Vec::new(),
            date,
        };
        profile.apply(fields);
        profile
    }

    /// Merge semantics: supplied fields overwrite, everything else is kept.
    pub fn apply(&mut self, fields: ProfileFields) {
        if fields.company.is_some() { self.company = fields.company; }
        if fields.website.is_some() { self.website = fields.website; }
        if fields.location.is_some() { self.location = fields.location; }
        if fields.bio.is_some() { self.bio = fields.bio; }
        if let Some(status) = fields.status { self.status = status; }
        if fields.githubusername.is_some() { self.githubusername = fields.githubusername; }
        if let Some(skills) = fields.skills { self.skills = skills; }
        self.social.merge(fields.social);
    }

    /// Newest entries go first.
    pub fn add_experience(&mut self, entry: Experience) {
        self.experience.insert(0, entry);
    }

    pub fn add_education(&mut self, entry: Education) {
        self.education.insert(0, entry);
    }

    /// Removes the entry whose id matches `id`. Unknown or malformed ids leave
    /// the list untouched and return `None`.
    pub fn remove_experience(&mut self, id: &str) -> Option<Experience> {
        let id = Uuid::parse_str(id).ok()?;
        let index = self.experience.iter().position(|entry| entry.id == id)?;
        Some(self.experience.remove(index))
    }

    pub fn remove_education(&mut self, id: &str) -> Option<Education> {
        let id = Uuid::parse_str(id).ok()?;
        let index = self.education.iter().position(|entry| entry.id == id)?;
        Some(self.education.remove(index))
    }

    pub fn populate(self, owner: Option<UserSummary>) -> PopulatedProfile {
        Profile {
            id: self.id,
            user: owner,
            company: self.company,
            website: self.website,
            location: self.location,
            bio: self.bio,
            status: self.status,
            githubusername: self.githubusername,
            skills: self.skills,
            social: self.social,
            experience: self.experience,
            education: self.education,
            date: self.date,
        }
    }
}

/// `"a, b ,c"` becomes `["a", "b", "c"]`.
pub fn parse_skills(raw: &str) -> Vec<String> {
    raw.split(',').map(|skill| skill.trim().to_string()).collect()
}

/// Request fields in the order they are declared, used to report validation
/// failures in a stable order.
pub trait FieldOrder {
    const FIELDS: &'static [&'static str];
}

fn supplied(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}


#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileInput {
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    #[validate(required(message = "Status is required"), length(min = 1, message = "Status is required"))]
    pub status: Option<String>,
    pub githubusername: Option<String>,
    #[validate(required(message = "Skills is required"), length(min = 1, message = "Skills is required"))]
    pub skills: Option<String>,
    pub youtube: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
}

impl FieldOrder for ProfileInput {
    const FIELDS: &'static [&'static str] = &[
        "company", "website", "location", "bio", "status", "githubusername", "skills",
        "youtube", "twitter", "facebook", "linkedin", "instagram",
    ];
}

impl ProfileInput {
    pub fn into_fields(self) -> ProfileFields {
        ProfileFields {
            company: supplied(self.company),
            website: supplied(self.website),
            location: supplied(self.location),
            bio: supplied(self.bio),
            status: supplied(self.status),
            githubusername: supplied(self.githubusername),
            skills: supplied(self.skills).map(|raw| parse_skills(&raw)),
            social: Social {
                youtube: supplied(self.youtube),
                twitter: supplied(self.twitter),
                facebook: supplied(self.facebook),
                linkedin: supplied(self.linkedin),
                instagram: supplied(self.instagram),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ExperienceInput {
    #[validate(required(message = "Title is required"), length(min = 1, message = "Title is required"))]
    pub title: Option<String>,
    #[validate(required(message = "Company is required"), length(min = 1, message = "Company is required"))]
    pub company: Option<String>,
    pub location: Option<String>,
    #[validate(required(message = "From date is required"), length(min = 1, message = "From date is required"))]
    pub from: Option<String>,
    pub to: Option<String>,
    pub current: Option<bool>,
    pub description: Option<String>,
}

impl FieldOrder for ExperienceInput {
    const FIELDS: &'static [&'static str] = &[
        "title", "company", "location", "from", "to", "current", "description",
    ];
}

impl ExperienceInput {
    /// Call after validation; required fields fall back to empty strings otherwise.
    pub fn into_entry(self) -> Experience {
        Experience {
            id: Uuid::new_v4(),
            title: self.title.unwrap_or_default(),
            company: self.company.unwrap_or_default(),
            location: supplied(self.location),
            from: self.from.unwrap_or_default(),
            to: supplied(self.to),
            current: self.current.unwrap_or(false),
            description: supplied(self.description),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct EducationInput {
    #[validate(required(message = "School is required"), length(min = 1, message = "School is required"))]
    pub school: Option<String>,
    #[validate(required(message = "Degree is required"), length(min = 1, message = "Degree is required"))]
    pub degree: Option<String>,
    #[validate(required(message = "Field of study is required"), length(min = 1, message = "Field of study is required"))]
    pub fieldofstudy: Option<String>,
    pub location: Option<String>,
    #[validate(required(message = "From date is required"), length(min = 1, message = "From date is required"))]
    pub from: Option<String>,
    pub to: Option<String>,
    pub current: Option<bool>,
    pub description: Option<String>,
}

impl FieldOrder for EducationInput {
    const FIELDS: &'static [&'static str] = &[
        "school", "degree", "fieldofstudy", "location", "from", "to", "current", "description",
    ];
}

impl EducationInput {
    pub fn into_entry(self) -> Education {
        Education {
            id: Uuid::new_v4(),
            school: self.school.unwrap_or_default(),
            degree: self.degree.unwrap_or_default(),
            fieldofstudy: self.fieldofstudy.unwrap_or_default(),
            location: supplied(self.location),
            from: self.from.unwrap_or_default(),
            to: supplied(self.to),
            current: self.current.unwrap_or(false),
            description: supplied(self.description),
        }
    }
}
