//! Durable record store.
//!
//! Every collection is held in memory and written through to JSON files, one file per record,
//! in a sharded directory structure:
//!
//! ```text
//! <data_dir>/
//!   <collection>/
//!     <s1>/
//!       <s2>/
//!         <id>/
//!           record.json
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the record id.
//!
//! A single `RwLock` guards all collections. Reads share it; writes take it exclusively and run
//! inside a [`Transaction`], so rules that span several records (a unit and its tenant, an
//! invoice and its payments) are checked and applied as one step. A transaction that returns an
//! error, or whose changes cannot be flushed to disk, is rolled back in memory.

use crate::constants::{RECORD_FILENAME, RECORD_TMP_FILENAME};
use crate::models::{
    Asset, Currency, Invoice, MaintenanceRequest, Payment, PaymentMode, PaymentType, Property,
    RentalUnit, Role, Tenant, User,
};
use crate::{RentalError, RentalResult};
use chrono::{DateTime, Utc};
use rentdesk_uuid::RecordId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// A persisted record type.
pub trait Record: Clone + Serialize + DeserializeOwned + 'static {
    /// Directory name under the data directory.
    const COLLECTION: &'static str;
    /// Human-readable name used in error messages.
    const LABEL: &'static str;

    fn id(&self) -> RecordId;
    fn created_at(&self) -> DateTime<Utc>;
    fn table(tables: &Tables) -> &Table<Self>;
    fn table_mut(tables: &mut Tables) -> &mut Table<Self>;
}

/// One collection of records, keyed by id.
#[derive(Debug, Clone)]
pub struct Table<T> {
    rows: BTreeMap<RecordId, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<T: Record> Table<T> {
    pub fn get(&self, id: &RecordId) -> Option<&T> {
        self.rows.get(id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.rows.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Records matching `predicate`, oldest first (ties broken by id).
    pub fn ordered_where(&self, mut predicate: impl FnMut(&T) -> bool) -> Vec<T> {
        let mut rows: Vec<T> = self.rows.values().filter(|r| predicate(r)).cloned().collect();
        rows.sort_by(|a, b| (a.created_at(), a.id()).cmp(&(b.created_at(), b.id())));
        rows
    }
}

/// All collections.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub currencies: Table<Currency>,
    pub payment_types: Table<PaymentType>,
    pub payment_modes: Table<PaymentMode>,
    pub roles: Table<Role>,
    pub users: Table<User>,
    pub properties: Table<Property>,
    pub rental_units: Table<RentalUnit>,
    pub tenants: Table<Tenant>,
    pub assets: Table<Asset>,
    pub maintenance_requests: Table<MaintenanceRequest>,
    pub invoices: Table<Invoice>,
    pub payments: Table<Payment>,
}

impl Tables {
    /// Typed lookup that fails with [`RentalError::NotFound`].
    pub fn require<T: Record>(&self, id: &RecordId) -> RentalResult<&T> {
        T::table(self)
            .get(id)
            .ok_or_else(|| RentalError::not_found(T::LABEL, id))
    }

    pub fn get<T: Record>(&self, id: &RecordId) -> Option<&T> {
        T::table(self).get(id)
    }
}

macro_rules! record {
    ($ty:ty, $field:ident, $label:literal) => {
        impl Record for $ty {
            const COLLECTION: &'static str = stringify!($field);
            const LABEL: &'static str = $label;

            fn id(&self) -> RecordId {
                self.id
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }

            fn table(tables: &Tables) -> &Table<Self> {
                &tables.$field
            }

            fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
                &mut tables.$field
            }
        }
    };
}

record!(Currency, currencies, "currency");
record!(PaymentType, payment_types, "payment type");
record!(PaymentMode, payment_modes, "payment mode");
record!(Role, roles, "role");
record!(User, users, "user");
record!(Property, properties, "property");
record!(RentalUnit, rental_units, "rental unit");
record!(Tenant, tenants, "tenant");
record!(Asset, assets, "asset");
record!(MaintenanceRequest, maintenance_requests, "maintenance request");
record!(Invoice, invoices, "invoice");
record!(Payment, payments, "payment");

enum Staged {
    Put {
        collection: &'static str,
        id: RecordId,
        json: Vec<u8>,
    },
    Delete {
        collection: &'static str,
        id: RecordId,
    },
}

type Undo = Box<dyn FnOnce(&mut Tables)>;

/// Staged changes made under the store's write lock.
///
/// Changes are visible to later reads in the same transaction immediately.
pub struct Transaction<'a> {
    tables: &'a mut Tables,
    staged: Vec<Staged>,
    undo: Vec<Undo>,
}

impl<'a> Transaction<'a> {
    fn new(tables: &'a mut Tables) -> Self {
        Self {
            tables,
            staged: Vec::new(),
            undo: Vec::new(),
        }
    }

    pub fn tables(&self) -> &Tables {
        self.tables
    }

    pub fn get<T: Record>(&self, id: &RecordId) -> Option<&T> {
        self.tables.get(id)
    }

    pub fn require<T: Record>(&self, id: &RecordId) -> RentalResult<&T> {
        self.tables.require(id)
    }

    /// Insert or replace a record.
    pub fn put<T: Record>(&mut self, record: T) -> RentalResult<()> {
        let json = serde_json::to_vec_pretty(&record).map_err(RentalError::Serialization)?;
        let id = record.id();
        let previous = T::table_mut(self.tables).rows.insert(id, record);

        self.undo.push(Box::new(move |tables: &mut Tables| {
            let rows = &mut T::table_mut(tables).rows;
            match previous {
                Some(previous) => {
                    rows.insert(id, previous);
                }
                None => {
                    rows.remove(&id);
                }
            }
        }));
        self.staged.push(Staged::Put {
            collection: T::COLLECTION,
            id,
            json,
        });
        Ok(())
    }

    /// Remove a record, returning it.
    pub fn delete<T: Record>(&mut self, id: &RecordId) -> RentalResult<T> {
        let removed = T::table_mut(self.tables)
            .rows
            .remove(id)
            .ok_or_else(|| RentalError::not_found(T::LABEL, id))?;

        let restore = removed.clone();
        let id = *id;
        self.undo.push(Box::new(move |tables: &mut Tables| {
            T::table_mut(tables).rows.insert(id, restore);
        }));
        self.staged.push(Staged::Delete {
            collection: T::COLLECTION,
            id,
        });
        Ok(removed)
    }

    fn rollback(self) {
        let Transaction { tables, undo, .. } = self;
        rollback(tables, undo);
    }
}

fn rollback(tables: &mut Tables, undo: Vec<Undo>) {
    for step in undo.into_iter().rev() {
        step(tables);
    }
}

/// The record store. Cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct Store {
    data_dir: PathBuf,
    tables: RwLock<Tables>,
}

impl Store {
    /// Open (or create) a store rooted at `data_dir` and load every collection.
    ///
    /// Record files that cannot be read or parsed are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::StorageDirCreation`] if the data directory cannot be created.
    pub fn open(data_dir: &Path) -> RentalResult<Self> {
        fs::create_dir_all(data_dir).map_err(RentalError::StorageDirCreation)?;

        let tables = Tables {
            currencies: load_table(data_dir),
            payment_types: load_table(data_dir),
            payment_modes: load_table(data_dir),
            roles: load_table(data_dir),
            users: load_table(data_dir),
            properties: load_table(data_dir),
            rental_units: load_table(data_dir),
            tenants: load_table(data_dir),
            assets: load_table(data_dir),
            maintenance_requests: load_table(data_dir),
            invoices: load_table(data_dir),
            payments: load_table(data_dir),
        };

        tracing::info!(
            data_dir = %data_dir.display(),
            properties = tables.properties.len(),
            rental_units = tables.rental_units.len(),
            tenants = tables.tenants.len(),
            invoices = tables.invoices.len(),
            "record store opened"
        );

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            tables: RwLock::new(tables),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Run `f` against a consistent snapshot of every collection.
    pub fn read<R>(&self, f: impl FnOnce(&Tables) -> RentalResult<R>) -> RentalResult<R> {
        let guard = self.tables.read().map_err(|_| RentalError::StorePoisoned)?;
        f(&guard)
    }

    /// Run `f` with exclusive access, persisting its changes if it succeeds.
    pub fn write<R>(
        &self,
        f: impl FnOnce(&mut Transaction<'_>) -> RentalResult<R>,
    ) -> RentalResult<R> {
        let mut guard = self.tables.write().map_err(|_| RentalError::StorePoisoned)?;
        let mut tx = Transaction::new(&mut guard);

        let value = match f(&mut tx) {
            Ok(value) => value,
            Err(e) => {
                tx.rollback();
                return Err(e);
            }
        };

        let Transaction { staged, undo, .. } = tx;
        if let Err(e) = self.flush(&staged) {
            tracing::error!("failed to persist {} staged change(s): {}", staged.len(), e);
            rollback(&mut guard, undo);
            return Err(e);
        }

        Ok(value)
    }

    fn record_dir(&self, collection: &str, id: &RecordId) -> PathBuf {
        id.sharded_dir(&self.data_dir.join(collection))
    }

    /// Persist staged changes in two phases.
    ///
    /// Every put is written to a temp file first. Only once all of them exist are they renamed
    /// into place and deletions applied. If any step fails, records already replaced get their
    /// previous bytes back and leftover temp files are removed.
    fn flush(&self, staged: &[Staged]) -> RentalResult<()> {
        let mut pending: Vec<PendingFile> = Vec::new();
        for change in latest_per_record(staged) {
            match self.prepare(change) {
                Ok(file) => pending.push(file),
                Err(e) => {
                    discard_temp_files(&pending);
                    return Err(e);
                }
            }
        }

        for (applied, file) in pending.iter().enumerate() {
            if let Err(e) = file.apply() {
                for done in pending[..applied].iter().rev() {
                    done.restore();
                }
                discard_temp_files(&pending[applied..]);
                return Err(e);
            }
        }
        Ok(())
    }

    fn prepare(&self, change: &Staged) -> RentalResult<PendingFile> {
        let (collection, id, json) = match change {
            Staged::Put {
                collection,
                id,
                json,
            } => (*collection, id, Some(json)),
            Staged::Delete { collection, id } => (*collection, id, None),
        };

        let dir = self.record_dir(collection, id);
        let record_path = dir.join(RECORD_FILENAME);
        let previous = if record_path.is_file() {
            Some(fs::read(&record_path).map_err(RentalError::FileRead)?)
        } else {
            None
        };

        let tmp = match json {
            Some(json) => {
                fs::create_dir_all(&dir).map_err(RentalError::StorageDirCreation)?;
                let tmp = dir.join(RECORD_TMP_FILENAME);
                if let Err(e) = fs::write(&tmp, json) {
                    let _ = fs::remove_file(&tmp);
                    return Err(RentalError::FileWrite(e));
                }
                Some(tmp)
            }
            None => None,
        };

        Ok(PendingFile { dir, tmp, previous })
    }
}

/// The last staged change for each record, in staging order.
///
/// A record put twice in one transaction shares one temp path, so only its final state is
/// written.
fn latest_per_record(staged: &[Staged]) -> Vec<&Staged> {
    let mut seen = BTreeSet::new();
    let mut latest: Vec<&Staged> = staged
        .iter()
        .rev()
        .filter(|change| {
            let key = match change {
                Staged::Put { collection, id, .. } | Staged::Delete { collection, id } => {
                    (*collection, *id)
                }
            };
            seen.insert(key)
        })
        .collect();
    latest.reverse();
    latest
}

/// One record's change, ready to be applied.
struct PendingFile {
    dir: PathBuf,
    /// Temp file holding the new contents; `None` for a deletion.
    tmp: Option<PathBuf>,
    /// Contents of `record.json` before this flush, if it existed.
    previous: Option<Vec<u8>>,
}

impl PendingFile {
    fn apply(&self) -> RentalResult<()> {
        match &self.tmp {
            Some(tmp) => {
                fs::rename(tmp, self.dir.join(RECORD_FILENAME)).map_err(RentalError::FileWrite)
            }
            None => match fs::remove_dir_all(&self.dir) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(RentalError::FileRemove(e)),
            },
        }
    }

    /// Put back what `apply` replaced. Failures are logged; there is nothing left to undo them.
    fn restore(&self) {
        let record_path = self.dir.join(RECORD_FILENAME);
        let result = match &self.previous {
            Some(bytes) => {
                fs::create_dir_all(&self.dir).and_then(|()| fs::write(&record_path, bytes))
            }
            None => match fs::remove_file(&record_path) {
                Ok(()) => {
                    let _ = fs::remove_dir(&self.dir);
                    Ok(())
                }
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e),
            },
        };
        if let Err(e) = result {
            tracing::error!("failed to restore {}: {}", record_path.display(), e);
        }
    }
}

fn discard_temp_files(files: &[PendingFile]) {
    for tmp in files.iter().filter_map(|f| f.tmp.as_ref()) {
        if let Err(e) = fs::remove_file(tmp) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!("failed to remove {}: {}", tmp.display(), e);
            }
        }
    }
}

/// Load every record of one collection from `<data_dir>/<collection>/<s1>/<s2>/<id>/record.json`.
fn load_table<T: Record>(data_dir: &Path) -> Table<T> {
    let mut table = Table::default();
    let collection_dir = data_dir.join(T::COLLECTION);

    let s1_iter = match fs::read_dir(&collection_dir) {
        Ok(it) => it,
        Err(_) => return table,
    };
    for s1 in s1_iter.flatten() {
        let s1_path = s1.path();
        if !s1_path.is_dir() {
            continue;
        }

        let s2_iter = match fs::read_dir(&s1_path) {
            Ok(it) => it,
            Err(_) => continue,
        };

        for s2 in s2_iter.flatten() {
            let s2_path = s2.path();
            if !s2_path.is_dir() {
                continue;
            }

            let id_iter = match fs::read_dir(&s2_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for id_ent in id_iter.flatten() {
                let record_path = id_ent.path().join(RECORD_FILENAME);
                if !record_path.is_file() {
                    continue;
                }

                let contents = match fs::read(&record_path) {
                    Ok(contents) => contents,
                    Err(e) => {
                        tracing::warn!("failed to read {}: {}", record_path.display(), e);
                        continue;
                    }
                };

                match serde_json::from_slice::<T>(&contents) {
                    Ok(record) => {
                        let dir_name = id_ent.file_name();
                        if dir_name.to_str() != Some(record.id().to_string().as_str()) {
                            tracing::warn!(
                                "skipping {}: id does not match its directory",
                                record_path.display()
                            );
                            continue;
                        }
                        table.rows.insert(record.id(), record);
                    }
                    Err(e) => {
                        tracing::warn!(
                            "failed to parse {} record: {} - {}",
                            T::LABEL,
                            record_path.display(),
                            e
                        );
                    }
                }
            }
        }
    }

    table
}
