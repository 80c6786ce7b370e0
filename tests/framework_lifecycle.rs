use regression_harness::framework::{self, FrameworkOptions};

// One test per binary: the lifecycle is process-wide.
#[test]
fn init_shutdown_reinit() {
    assert!(!framework::is_initialized());

    framework::init(FrameworkOptions::cpu(3)).unwrap();
    assert_eq!(framework::current(), Some(FrameworkOptions::cpu(3)));
    assert!(framework::init(FrameworkOptions::cpu(2)).is_err());

    framework::shutdown();
    assert!(!framework::is_initialized());
    framework::shutdown();

    framework::init(FrameworkOptions::cpu(2)).unwrap();
    assert_eq!(framework::current(), Some(FrameworkOptions::cpu(2)));
}
