use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use uuid::Uuid;
use devbook_database::basic_db::SafeDatabase;
use devbook_service::parser::profile::{
    EducationInput, ExperienceInput, PopulatedProfile, Profile, ProfileInput,
};
use devbook_service::parser::user::{UserRecord, UserSummary};

use crate::auth::AuthUser;
use crate::error::{Message, ProfileError};
use crate::extract::ValidatedJson;
use crate::server::AppState;

pub const PROFILES: &str = "profiles";
pub const USERS: &str = "users";

const NO_PROFILE: &str = "There is no profile for this user";
const PROFILE_NOT_FOUND: &str = "Profile not found";


fn load_owner<T: SafeDatabase>(database: &T, user: &Uuid) -> Result<Option<UserSummary>, ProfileError> {
    let Some(data) = database.read(&user.to_string(), USERS)? else {
        return Ok(None);
    };

    let record: UserRecord = serde_json::from_slice(&data)?;
    Ok(Some(record.into()))
}

fn find_populated<T: SafeDatabase>(database: &T, user: &Uuid) -> Result<Option<PopulatedProfile>, ProfileError> {
    let Some(data) = database.read(&user.to_string(), PROFILES)? else {
        return Ok(None);
    };

    let profile: Profile = serde_json::from_slice(&data)?;
    let owner = load_owner(database, &profile.user)?;
    Ok(Some(profile.populate(owner)))
}

/// Runs `f` on the caller's stored profile (if any) and saves what it returns,
/// all inside one store transaction.
fn modify_profile<T, F>(database: &T, user: &Uuid, f: F) -> Result<Profile, ProfileError>
where
    T: SafeDatabase,
    F: FnOnce(Option<Profile>) -> Result<Profile, ProfileError>,
{
    let mut saved = None;

    database.update(&user.to_string(), PROFILES, |current| {
        let current = current
            .as_deref()
            .map(serde_json::from_slice::<Profile>)
            .transpose()?;

        let profile = f(current)?;
        let data = serde_json::to_vec(&profile)?;
        saved = Some(profile);
        Ok::<_, ProfileError>(Some(data))
    })?;

    saved.ok_or(ProfileError::NotFound(NO_PROFILE))
}


pub async fn get_current_profile<T: SafeDatabase>(
    State(state): State<AppState<T>>,
    auth: AuthUser,
) -> Result<Json<PopulatedProfile>, ProfileError> {
    find_populated(&state.database, &auth.id)?
        .map(Json)
        .ok_or(ProfileError::NotFound(NO_PROFILE))
}


pub async fn upsert_profile<T: SafeDatabase>(
    State(state): State<AppState<T>>,
    auth: AuthUser,
    ValidatedJson(input): ValidatedJson<ProfileInput>,
) -> Result<Json<Profile>, ProfileError> {
    let fields = input.into_fields();

    let profile = modify_profile(&state.database, &auth.id, |current| {
        Ok(match current {
            Some(mut profile) => {
                profile.apply(fields);
                profile
            }
            None => Profile::create(auth.id, fields, Utc::now()),
        })
    })?;

    Ok(Json(profile))
}


pub async fn get_all_profiles<T: SafeDatabase>(
    State(state): State<AppState<T>>,
) -> Result<Json<Vec<PopulatedProfile>>, ProfileError> {
    let records = state.database.read_all(PROFILES)?;

    let mut profiles = Vec::with_capacity(records.len());
    for (_, data) in records {
        let profile: Profile = serde_json::from_slice(&data)?;
        let owner = load_owner(&state.database, &profile.user)?;
        profiles.push(profile.populate(owner));
    }

    // oldest first, i.e. creation order
    profiles.sort_by_key(|profile| profile.date);
    Ok(Json(profiles))
}


pub async fn get_profile_by_user<T: SafeDatabase>(
    State(state): State<AppState<T>>,
    Path(user_id): Path<String>,
) -> Result<Json<PopulatedProfile>, ProfileError> {
    let user_id = Uuid::parse_str(&user_id)
        .map_err(|_| ProfileError::NotFound(PROFILE_NOT_FOUND))?;

    find_populated(&state.database, &user_id)?
        .map(Json)
        .ok_or(ProfileError::NotFound(PROFILE_NOT_FOUND))
}


pub async fn delete_account<T: SafeDatabase>(
    State(state): State<AppState<T>>,
    auth: AuthUser,
) -> Result<Json<Message>, ProfileError> {
    let key = auth.id.to_string();

    // TODO: remove the user's posts as well once posts live in this store
    state.database.remove(&key, PROFILES)?;
    state.database.remove(&key, USERS)?;

    tracing::info!(user = %auth.id, "deleted profile and account");
    Ok(Json(Message::new("User data deleted")))
}


pub async fn add_experience<T: SafeDatabase>(
    State(state): State<AppState<T>>,
    auth: AuthUser,
    ValidatedJson(input): ValidatedJson<ExperienceInput>,
) -> Result<Json<Profile>, ProfileError> {
    let entry = input.into_entry();

    let profile = modify_profile(&state.database, &auth.id, |current| {
        let mut profile = current.ok_or(ProfileError::NotFound(NO_PROFILE))?;
        profile.add_experience(entry);
        Ok(profile)
    })?;

    Ok(Json(profile))
}


pub async fn remove_experience<T: SafeDatabase>(
    State(state): State<AppState<T>>,
    auth: AuthUser,
    Path(exp_id): Path<String>,
) -> Result<Json<Profile>, ProfileError> {
    let profile = modify_profile(&state.database, &auth.id, |current| {
        let mut profile = current.ok_or(ProfileError::NotFound(NO_PROFILE))?;
        profile
            .remove_experience(&exp_id)
            .ok_or(ProfileError::NotFound("Experience does not exist"))?;
        Ok(profile)
    })?;

    Ok(Json(profile))
}


pub async fn add_education<T: SafeDatabase>(
    State(state): State<AppState<T>>,
    auth: AuthUser,
    ValidatedJson(input): ValidatedJson<EducationInput>,
) -> Result<Json<Profile>, ProfileError> {
    let entry = input.into_entry();

    let profile = modify_profile(&state.database, &auth.id, |current| {
        let mut profile = current.ok_or(ProfileError::NotFound(NO_PROFILE))?;
        profile.add_education(entry);
        Ok(profile)
    })?;

    Ok(Json(profile))
}


pub async fn remove_education<T: SafeDatabase>(
    State(state): State<AppState<T>>,
    auth: AuthUser,
    Path(edu_id): Path<String>,
) -> Result<Json<Profile>, ProfileError> {
    let profile = modify_profile(&state.database, &auth.id, |current| {
        let mut profile = current.ok_or(ProfileError::NotFound(NO_PROFILE))?;
        profile
            .remove_education(&edu_id)
            .ok_or(ProfileError::NotFound("Education does not exist"))?;
        Ok(profile)
    })?;

    Ok(Json(profile))
}




#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};
    use devbook_database::basic_db::InnerDatabase;
    use crate::auth::TokenVerifier;

    fn setup() -> Result<(TempDir, AppState<InnerDatabase>), Box<dyn std::error::Error>> {
        let temp_dir = tempdir()?;
        let db = InnerDatabase::new(temp_dir.path().join("test_db"))?;
        let state = AppState {
            database: db,
            tokens: Arc::new(TokenVerifier::new(b"test-secret")),
        };
        Ok((temp_dir, state))
    }

    fn seed_user(db: &InnerDatabase, name: &str) -> Result<Uuid, Box<dyn std::error::Error>> {
        let user = UserRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            avatar: format!("//www.gravatar.com/avatar/{}", name.to_lowercase()),
            date: Utc::now(),
        };
        db.write(&user.id.to_string(), &serde_json::to_string(&user)?, USERS)?;
        Ok(user.id)
    }

    fn profile_input(status: &str, skills: &str) -> ProfileInput {
        ProfileInput {
            status: Some(status.to_string()),
            skills: Some(skills.to_string()),
            ..Default::default()
        }
    }

    fn experience_input(title: &str) -> ExperienceInput {
        ExperienceInput {
            title: Some(title.to_string()),
            company: Some("Acme".to_string()),
            from: Some("2019-03-01".to_string()),
            current: Some(true),
            ..Default::default()
        }
    }

    fn education_input(school: &str) -> EducationInput {
        EducationInput {
            school: Some(school.to_string()),
            degree: Some("BSc".to_string()),
            fieldofstudy: Some("Computer Science".to_string()),
            from: Some("2010-09-01".to_string()),
            ..Default::default()
        }
    }

    async fn create_profile(state: &AppState<InnerDatabase>, id: Uuid) -> Result<Profile, ProfileError> {
        let Json(profile) = upsert_profile(
            State(state.clone()),
            AuthUser { id },
            ValidatedJson(profile_input("Developer", "rust, axum ,tokio")),
        )
        .await?;
        Ok(profile)
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates_in_place() -> Result<(), Box<dyn std::error::Error>> {
        let (_dir, state) = setup()?;
        let id = seed_user(&state.database, "Jane")?;

        let created = create_profile(&state, id).await?;
        assert_eq!(created.user, id);
        assert_eq!(created.skills, vec!["rust", "axum", "tokio"]);

        let mut update = profile_input("Lead", "rust");
        update.company = Some("Acme".to_string());
        update.twitter = Some("@jane".to_string());
        let Json(updated) = upsert_profile(State(state.clone()), AuthUser { id }, ValidatedJson(update)).await?;

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.date, created.date);
        assert_eq!(updated.status, "Lead");
        assert_eq!(updated.company.as_deref(), Some("Acme"));
        assert_eq!(updated.social.twitter.as_deref(), Some("@jane"));

        // one document per user
        assert_eq!(state.database.read_all(PROFILES)?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_current_profile() -> Result<(), Box<dyn std::error::Error>> {
        let (_dir, state) = setup()?;
        let id = seed_user(&state.database, "Jane")?;

        let missing = get_current_profile(State(state.clone()), AuthUser { id }).await;
        assert!(matches!(missing, Err(ProfileError::NotFound(NO_PROFILE))));

        create_profile(&state, id).await?;
        let Json(profile) = get_current_profile(State(state.clone()), AuthUser { id }).await?;

        let owner = profile.user.ok_or("owner not joined")?;
        assert_eq!(owner.id, id);
        assert_eq!(owner.name, "Jane");
        assert_eq!(owner.avatar, "//www.gravatar.com/avatar/jane");
        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_profiles_joins_owners() -> Result<(), Box<dyn std::error::Error>> {
        let (_dir, state) = setup()?;

        let Json(empty) = get_all_profiles(State(state.clone())).await?;
        assert!(empty.is_empty());

        let jane = seed_user(&state.database, "Jane")?;
        let john = seed_user(&state.database, "John")?;
        create_profile(&state, jane).await?;
        create_profile(&state, john).await?;

        let Json(profiles) = get_all_profiles(State(state.clone())).await?;
        assert_eq!(profiles.len(), 2);

        let mut names: Vec<String> = profiles
            .into_iter()
            .filter_map(|profile| profile.user.map(|owner| owner.name))
            .collect();
        names.sort();
        assert_eq!(names, vec!["Jane", "John"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_profile_by_user() -> Result<(), Box<dyn std::error::Error>> {
        let (_dir, state) = setup()?;
        let id = seed_user(&state.database, "Jane")?;
        create_profile(&state, id).await?;

        let Json(profile) = get_profile_by_user(State(state.clone()), Path(id.to_string())).await?;
        assert_eq!(profile.user.map(|owner| owner.id), Some(id));

        let unknown = get_profile_by_user(State(state.clone()), Path(Uuid::new_v4().to_string())).await;
        assert!(matches!(unknown, Err(ProfileError::NotFound(PROFILE_NOT_FOUND))));

        let malformed = get_profile_by_user(State(state.clone()), Path("1234".to_string())).await;
        assert!(matches!(malformed, Err(ProfileError::NotFound(PROFILE_NOT_FOUND))));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_account_removes_profile_and_user() -> Result<(), Box<dyn std::error::Error>> {
        let (_dir, state) = setup()?;
        let id = seed_user(&state.database, "Jane")?;
        create_profile(&state, id).await?;

        let Json(message) = delete_account(State(state.clone()), AuthUser { id }).await?;
        assert_eq!(message.msg, "User data deleted");

        assert!(state.database.read(&id.to_string(), PROFILES)?.is_none());
        assert!(state.database.read(&id.to_string(), USERS)?.is_none());

        let after = get_current_profile(State(state.clone()), AuthUser { id }).await;
        assert!(matches!(after, Err(ProfileError::NotFound(NO_PROFILE))));

        // deleting again is a no-op
        delete_account(State(state.clone()), AuthUser { id }).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_experience_add_and_remove() -> Result<(), Box<dyn std::error::Error>> {
        let (_dir, state) = setup()?;
        let id = seed_user(&state.database, "Jane")?;
        create_profile(&state, id).await?;

        add_experience(State(state.clone()), AuthUser { id }, ValidatedJson(experience_input("Junior"))).await?;
        let Json(profile) = add_experience(State(state.clone()), AuthUser { id }, ValidatedJson(experience_input("Senior"))).await?;

        let titles: Vec<&str> = profile.experience.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Senior", "Junior"]);
        assert!(profile.experience[0].current);

        let junior = profile.experience[1].id;
        let Json(profile) = remove_experience(State(state.clone()), AuthUser { id }, Path(junior.to_string())).await?;
        assert_eq!(profile.experience.len(), 1);
        assert_eq!(profile.experience[0].title, "Senior");

        let unknown = remove_experience(State(state.clone()), AuthUser { id }, Path(junior.to_string())).await;
        assert!(matches!(unknown, Err(ProfileError::NotFound("Experience does not exist"))));

        let Json(stored) = get_current_profile(State(state.clone()), AuthUser { id }).await?;
        assert_eq!(stored.experience.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_education_add_and_remove() -> Result<(), Box<dyn std::error::Error>> {
        let (_dir, state) = setup()?;
        let id = seed_user(&state.database, "Jane")?;
        create_profile(&state, id).await?;

        add_education(State(state.clone()), AuthUser { id }, ValidatedJson(education_input("First"))).await?;
        let Json(profile) = add_education(State(state.clone()), AuthUser { id }, ValidatedJson(education_input("Second"))).await?;
        assert_eq!(profile.education[0].school, "Second");
        assert_eq!(profile.education[1].school, "First");

        let first = profile.education[1].id;
        let Json(profile) = remove_education(State(state.clone()), AuthUser { id }, Path(first.to_string())).await?;
        assert_eq!(profile.education.len(), 1);
        assert_eq!(profile.education[0].school, "Second");

        let malformed = remove_education(State(state.clone()), AuthUser { id }, Path("nope".to_string())).await;
        assert!(matches!(malformed, Err(ProfileError::NotFound("Education does not exist"))));
        Ok(())
    }

    #[tokio::test]
    async fn test_entries_require_existing_profile() -> Result<(), Box<dyn std::error::Error>> {
        let (_dir, state) = setup()?;
        let id = seed_user(&state.database, "Jane")?;

        let result = add_experience(State(state.clone()), AuthUser { id }, ValidatedJson(experience_input("Junior"))).await;
        assert!(matches!(result, Err(ProfileError::NotFound(NO_PROFILE))));

        let result = add_education(State(state.clone()), AuthUser { id }, ValidatedJson(education_input("School"))).await;
        assert!(matches!(result, Err(ProfileError::NotFound(NO_PROFILE))));

        assert!(state.database.read(&id.to_string(), PROFILES)?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_owner_is_joined_as_null() -> Result<(), Box<dyn std::error::Error>> {
        let (_dir, state) = setup()?;
        let id = Uuid::new_v4();
        create_profile(&state, id).await?;

        let Json(profile) = get_profile_by_user(State(state.clone()), Path(id.to_string())).await?;
        assert!(profile.user.is_none());
        Ok(())
    }
}
