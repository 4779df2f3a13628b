use chrono::Utc;
use rand::Rng;
use std::fmt;

/// StoreId binds a data store to the cluster lineage it was created in. Two members serve the
/// same logical database iff their store ids are equal.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct StoreId {
    creation_time: i64,
    random_id: i64,
    upgrade_time: i64,
    upgrade_id: i64,
}

impl StoreId {
    pub fn new(creation_time: i64, random_id: i64, upgrade_time: i64, upgrade_id: i64) -> Self {
        StoreId {
            creation_time,
            random_id,
            upgrade_time,
            upgrade_id,
        }
    }

    /// Creates the id for a brand new store. A new store has never been upgraded, so the upgrade
    /// fields mirror the creation fields.
    pub fn generate() -> Self {
        let creation_time = Utc::now().timestamp_millis();
        let random_id = rand::thread_rng().gen::<i64>();
        StoreId::new(creation_time, random_id, creation_time, random_id)
    }

    pub fn creation_time(&self) -> i64 {
        self.creation_time
    }

    pub fn random_id(&self) -> i64 {
        self.random_id
    }

    pub fn upgrade_time(&self) -> i64 {
        self.upgrade_time
    }

    pub fn upgrade_id(&self) -> i64 {
        self.upgrade_id
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Store{{creationTime:{}, randomId:{}, upgradeTime:{}, upgradeId:{}}}",
            self.creation_time, self.random_id, self.upgrade_time, self.upgrade_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        let a = StoreId::generate();
        let b = StoreId::generate();
        assert_ne!(a, b);
        assert_eq!(a.creation_time(), a.upgrade_time());
        assert_eq!(a.random_id(), a.upgrade_id());
    }

    #[test]
    fn equality_is_over_every_field() {
        let id = StoreId::new(1, 2, 3, 4);
        assert_eq!(id, StoreId::new(1, 2, 3, 4));
        assert_ne!(id, StoreId::new(1, 2, 3, 5));
    }
}
