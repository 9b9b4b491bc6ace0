use libmdbx::{Database, DatabaseOptions, WriteMap, WriteFlags, TableFlags};
use std::sync::{Arc, Mutex};
use std::path::Path;

pub use libmdbx::Error;

#[derive(Clone)]
pub struct InnerDatabase {
    db: Arc<Mutex<Database<WriteMap>>>,
}

/// Key/value document store shared across request handlers.
///
/// Values are opaque byte strings; callers decide the encoding (JSON in practice).
/// Every method runs in its own transaction.
pub trait SafeDatabase: Clone + Send + Sync + 'static {

    fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> where Self: Sized;

    fn write(&self, key: &str, value: &str, table: &str) -> Result<(), Error>;

    fn read(&self, key: &str, table: &str) -> Result<Option<Vec<u8>>, Error>;

    /// All records of `table` in key order. A table that was never written is empty.
    fn read_all(&self, table: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>, Error>;

    /// Returns `true` if a record was removed.
    fn remove(&self, key: &str, table: &str) -> Result<bool, Error>;

    /// Read-modify-write of a single record inside one read-write transaction.
    ///
    /// `f` sees the current value. Returning `Ok(Some(bytes))` stores `bytes`,
    /// `Ok(None)` leaves the record as it was, and `Err` aborts the transaction.
    /// The value returned by `f` is passed back to the caller.
    fn update<F, E>(&self, key: &str, table: &str, f: F) -> Result<Option<Vec<u8>>, E>
    where
        F: FnOnce(Option<Vec<u8>>) -> Result<Option<Vec<u8>>, E>,
        E: From<Error>;
}


impl SafeDatabase for InnerDatabase{

    fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut options = DatabaseOptions::default();
        options.max_tables = Some(100);
        let db = Database::<WriteMap>::open_with_options(path, options)?;

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }


    fn write(&self, key: &str, value: &str, table: &str) -> Result<(), Error> {
        let db = self.db.lock().expect("Failed to lock database mutex");
        let transaction = db.begin_rw_txn()?;
        let table = transaction.create_table(Some(table), TableFlags::default())?;

        transaction.put(&table, key, value, WriteFlags::default())?;
        transaction.commit()?;
        Ok(())
    }


    fn read(&self, key: &str, table: &str) -> Result<Option<Vec<u8>>, Error> {
        let db = self.db.lock().expect("Failed to lock database mutex");
        let transaction = db.begin_ro_txn()?;

        if let Ok(table) = transaction.open_table(Some(table)) {
            let result = transaction.get(&table, key.as_bytes())?;
            return Ok(result);
        }

        Ok(None)
    }

    fn read_all(&self, table: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>, Error> {
        let mut records = Vec::new();
        let db = self.db.lock().expect("Failed to lock database mutex");
        let transaction = db.begin_ro_txn()?;

        if let Ok(table) = transaction.open_table(Some(table)) {
            let mut cursor = transaction.cursor(&table)?;

            for item in cursor.iter_start::<Vec<u8>, Vec<u8>>() {
                let (key, value) = item?;
                records.push((key, value));
            }
        }

        Ok(records)
    }


    fn remove(&self, key: &str, table: &str) -> Result<bool, Error> {
        let db = self.db.lock().expect("Failed to lock database mutex");
        let transaction = db.begin_rw_txn()?;
        let table = transaction.create_table(Some(table), TableFlags::default())?;

        let removed = transaction.del(&table, key, None)?;
        transaction.commit()?;
        Ok(removed)
    }


    fn update<F, E>(&self, key: &str, table: &str, f: F) -> Result<Option<Vec<u8>>, E>
    where
        F: FnOnce(Option<Vec<u8>>) -> Result<Option<Vec<u8>>, E>,
        E: From<Error>,
    {
        let db = self.db.lock().expect("Failed to lock database mutex");
        let transaction = db.begin_rw_txn()?;
        let table = transaction.create_table(Some(table), TableFlags::default())?;

        let current: Option<Vec<u8>> = transaction.get(&table, key.as_bytes())?;

        // an Err from `f` drops the transaction, which aborts it
        let next = f(current)?;

        if let Some(value) = &next {
            transaction.put(&table, key, value, WriteFlags::default())?;
        }

        transaction.commit()?;
        Ok(next)
    }
}
