use crate::domain::codec;
use crate::domain::payee::{Address, Payee};
use crate::domain::ports::StateStoreRef;
use crate::error::{LedgerError, Result};

const PAYEE_PREFIX: &str = "payee:";
const ACTIVE_INDEX_KEY: &str = "payee_index";

/// Payee records plus an explicit ordered index of active payees.
///
/// The index is what the scheduler enumerates. Soft-deleted payees keep
/// their record in the store for audit but leave the index, so a
/// settlement pass sees every active payee exactly once with no bound on
/// how many there are.
pub struct PayeeRegistry {
    store: StateStoreRef,
}

impl PayeeRegistry {
    pub fn new(store: StateStoreRef) -> Self {
        Self { store }
    }

    fn record_key(address: &Address) -> String {
        format!("{PAYEE_PREFIX}{address}")
    }

    /// True if any record exists for this address, active or not.
    /// Addresses are never reused.
    pub async fn exists(&self, address: &Address) -> Result<bool> {
        self.store.has(&Self::record_key(address)).await
    }

    pub async fn get(&self, address: &Address) -> Result<Payee> {
        let bytes = self
            .store
            .get(&Self::record_key(address))
            .await?
            .ok_or_else(|| LedgerError::NotFound(address.clone()))?;
        codec::decode_payee(&bytes)
    }

    pub async fn save(&self, payee: &Payee) -> Result<()> {
        let bytes = codec::encode_payee(payee)?;
        self.store.set(&Self::record_key(&payee.address), bytes).await
    }

    /// Creates a brand-new record and adds it to the active index.
    pub async fn insert_new(&self, payee: &Payee) -> Result<()> {
        if self.exists(&payee.address).await? {
            return Err(LedgerError::AlreadyExists(payee.address.clone()));
        }
        self.save(payee).await?;

        let mut index = self.load_index().await?;
        if let Err(pos) = index.binary_search(&payee.address) {
            index.insert(pos, payee.address.clone());
        }
        self.store_index(&index).await
    }

    /// Soft-deletes a payee: the record stays, the index entry goes.
    pub async fn deactivate(&self, address: &Address) -> Result<Payee> {
        let mut payee = self.get(address).await?;
        if !payee.active {
            return Err(LedgerError::AlreadyInactive(address.clone()));
        }
        payee.deactivate();
        self.save(&payee).await?;

        let mut index = self.load_index().await?;
        if let Ok(pos) = index.binary_search(address) {
            index.remove(pos);
        }
        self.store_index(&index).await?;
        Ok(payee)
    }

    /// Every active payee, in address order.
    pub async fn active_addresses(&self) -> Result<Vec<Address>> {
        self.load_index().await
    }

    async fn load_index(&self) -> Result<Vec<Address>> {
        match self.store.get(ACTIVE_INDEX_KEY).await? {
            Some(bytes) => codec::decode_index(&bytes),
            None => Ok(Vec::new()),
        }
    }

    async fn store_index(&self, index: &[Address]) -> Result<()> {
        self.store.set(ACTIVE_INDEX_KEY, codec::encode_index(index)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryStateStore;
    use std::sync::Arc;

    fn registry() -> PayeeRegistry {
        PayeeRegistry::new(Arc::new(InMemoryStateStore::new()))
    }

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let registry = registry();
        let payee = Payee::new(addr("alice"), 1000, 100, 0);
        registry.insert_new(&payee).await.unwrap();

        assert_eq!(registry.get(&addr("alice")).await.unwrap(), payee);
        assert!(matches!(
            registry.get(&addr("bob")).await,
            Err(LedgerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let registry = registry();
        let payee = Payee::new(addr("alice"), 1000, 100, 0);
        registry.insert_new(&payee).await.unwrap();

        let err = registry.insert_new(&payee).await.unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_duplicate_rejected_after_deactivation() {
        let registry = registry();
        let payee = Payee::new(addr("alice"), 1000, 100, 0);
        registry.insert_new(&payee).await.unwrap();
        registry.deactivate(&addr("alice")).await.unwrap();

        // The address is burned even though the payee is inactive.
        let err = registry.insert_new(&payee).await.unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_deactivate_twice_rejected() {
        let registry = registry();
        registry
            .insert_new(&Payee::new(addr("alice"), 1000, 100, 0))
            .await
            .unwrap();
        registry.deactivate(&addr("alice")).await.unwrap();

        let err = registry.deactivate(&addr("alice")).await.unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyInactive(_)));
    }

    #[tokio::test]
    async fn test_deactivated_record_preserved_for_audit() {
        let registry = registry();
        let mut payee = Payee::new(addr("alice"), 1000, 100, 0);
        payee.record_payment(3000);
        registry.insert_new(&payee).await.unwrap();
        registry.deactivate(&addr("alice")).await.unwrap();

        let record = registry.get(&addr("alice")).await.unwrap();
        assert!(!record.active);
        assert_eq!(record.salary, 1000);
        assert_eq!(record.total_paid, 3000);
    }

    #[tokio::test]
    async fn test_active_index_ordered_and_tracks_removals() {
        let registry = registry();
        for name in ["carol", "alice", "bob"] {
            registry
                .insert_new(&Payee::new(addr(name), 1, 1, 0))
                .await
                .unwrap();
        }
        assert_eq!(
            registry.active_addresses().await.unwrap(),
            vec![addr("alice"), addr("bob"), addr("carol")]
        );

        registry.deactivate(&addr("bob")).await.unwrap();
        assert_eq!(
            registry.active_addresses().await.unwrap(),
            vec![addr("alice"), addr("carol")]
        );
    }
}
