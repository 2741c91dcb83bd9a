use dtusim_core::soc::memory::controller::MemoryController;
use mockall::mock;

mock! {
    pub Controller {}
    impl MemoryController for Controller {
        fn access_latency(&mut self, addr: u64) -> u64;
    }
}

impl std::fmt::Debug for MockController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MockController")
    }
}
