//! # Re-entrancy
//!
//! A target reached by dispatch that calls back into the same unit is
//! refused, for entry points and views alike.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use keep_core::errors::RuntimeError;
    use keep_core::prelude::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Hook = Box<dyn Fn() -> Result<(), KeepError> + Send>;

    /// Runtime whose plain calls first run a callback, standing in for target
    /// code that calls back into the unit.
    struct HookedRuntime {
        inner: InMemoryRuntime,
        hook: Arc<Mutex<Option<Hook>>>,
    }

    impl Journaled for HookedRuntime {
        type Snapshot = InMemoryRuntime;

        fn snapshot(&self) -> Self::Snapshot {
            self.inner.snapshot()
        }

        fn restore(&mut self, snapshot: Self::Snapshot) {
            self.inner.restore(snapshot);
        }
    }

    impl ExecutionRuntime for HookedRuntime {
        fn chain_id(&self) -> u64 {
            self.inner.chain_id()
        }

        fn has_code(&self, account: Address) -> bool {
            self.inner.has_code(account)
        }

        fn call(&mut self, from: Address, to: Address, value: U256, data: &[u8]) -> Result<Bytes, RuntimeError> {
            if let Some(hook) = self.hook.lock().as_ref() {
                hook().map_err(|err| RuntimeError::Reverted(err.to_string()))?;
            }
            self.inner.call(from, to, value, data)
        }

        fn delegate_call(&mut self, context: Address, target: Address, data: &[u8]) -> Result<Bytes, RuntimeError> {
            self.inner.delegate_call(context, target, data)
        }

        fn create(&mut self, from: Address, value: U256, code: &[u8]) -> Result<Address, RuntimeError> {
            self.inner.create(from, value, code)
        }

        fn create2(&mut self, from: Address, value: U256, salt: Hash, code: &[u8]) -> Result<Address, RuntimeError> {
            self.inner.create2(from, value, salt, code)
        }

        fn is_valid_signature(&self, signer: Address, digest: &Hash, signature: &[u8]) -> [u8; 4] {
            self.inner.is_valid_signature(signer, digest, signature)
        }
    }

    type HookedService = KeepService<InMemoryLedger, HookedRuntime>;

    fn hooked_service() -> (HookedService, Arc<Mutex<Option<Hook>>>, Vec<TestSigner>) {
        keep_telemetry::init_test_logging();
        let hook = Arc::new(Mutex::new(None));
        let runtime = HookedRuntime {
            inner: InMemoryRuntime::new(CHAIN_ID),
            hook: Arc::clone(&hook),
        };
        let keep = Keep::new(unit_address(), InMemoryLedger::new(), runtime);
        let (service, _bus) = KeepService::in_memory(keep, ServiceConfig::default());
        let members = signers(1);
        service
            .initialize(Vec::new(), addresses(&members), 1)
            .unwrap();
        (service, hook, members)
    }

    fn execute_sample(service: &HookedService, member: &TestSigner) -> Result<(), KeepError> {
        let operation = sample_call();
        let signatures = sign_operation(service, &[member], &operation);
        service.execute(operation, signatures)
    }

    #[test]
    fn test_reentrant_entry_point_aborts_outer_call() {
        let (service, hook, members) = hooked_service();
        let inner = service.clone();
        let relayer = Address::from_low_u64(0x0a11);
        *hook.lock() = Some(Box::new(move || inner.relay(relayer, sample_call())));

        let result = execute_sample(&service, &members[0]);

        assert_eq!(
            result,
            Err(KeepError::ExecutionFailed(
                "reverted: reentrant call rejected".to_string()
            ))
        );
        hook.lock().take();
        assert_eq!(service.nonce().unwrap(), 0);
        assert_eq!(service.stats().reentrancy_rejections, 1);
    }

    #[test]
    fn test_reentrant_view_refused() {
        let (service, hook, members) = hooked_service();
        let inner = service.clone();
        let seen = Arc::new(Mutex::new(None));
        let record = Arc::clone(&seen);
        *hook.lock() = Some(Box::new(move || {
            *record.lock() = Some(inner.quorum());
            Ok(())
        }));

        // The target swallows the refusal, so the outer call commits
        execute_sample(&service, &members[0]).unwrap();

        hook.lock().take();
        assert_eq!(*seen.lock(), Some(Err(KeepError::Reentrancy)));
        assert_eq!(service.nonce().unwrap(), 1);
    }

    #[test]
    fn test_reentrant_engine_access_refused() {
        let (service, hook, members) = hooked_service();
        let inner = service.clone();
        *hook.lock() = Some(Box::new(move || inner.with_engine(|keep| keep.nonce()).map(|_| ())));

        assert!(execute_sample(&service, &members[0]).is_err());
        hook.lock().take();
    }

    #[test]
    fn test_guard_released_after_call() {
        let (service, hook, members) = hooked_service();
        let inner = service.clone();
        *hook.lock() = Some(Box::new(move || inner.quorum().map(|_| ())));
        assert!(execute_sample(&service, &members[0]).is_err());

        hook.lock().take();
        execute_sample(&service, &members[0]).unwrap();
        assert_eq!(service.quorum().unwrap(), 1);
    }
}
