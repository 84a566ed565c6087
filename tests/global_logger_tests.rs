use xc_logger::adapters::{GlobalErrorHub, HostCapabilities};
use xc_logger::{global, init, LogLevel, LoggerConfig};

#[test]
fn init_is_idempotent_and_registers_hooks_once() {
    assert!(global().is_none());

    let hub = GlobalErrorHub::new();
    let host = HostCapabilities::detached().with_global_errors(hub.clone());
    let first = init(LoggerConfig::default(), host);

    let other_hub = GlobalErrorHub::new();
    let second = init(
        LoggerConfig::default().with_min_level(LogLevel::Error),
        HostCapabilities::detached().with_global_errors(other_hub.clone()),
    );
    assert!(std::ptr::eq(first, second));
    assert!(std::ptr::eq(first, global().unwrap()));
    assert_eq!(second.log_level(), LogLevel::Debug);

    hub.emit_rejection("lost connection");
    assert_eq!(first.len(), 1);

    other_hub.emit_rejection("ignored");
    assert_eq!(first.len(), 1);
}

#[test]
fn panics_are_captured_as_uncaught_errors() {
    let hub = GlobalErrorHub::new();
    let logger = xc_logger::Logger::new(
        LoggerConfig::default(),
        HostCapabilities::detached().with_global_errors(hub.clone()),
    );
    hub.install_panic_hook();
    hub.install_panic_hook();

    let result = std::thread::spawn(|| panic!("worker exploded")).join();
    assert!(result.is_err());

    let logs: Vec<_> = logger
        .get_logs()
        .into_iter()
        .filter(|e| e.error.as_ref().map(|e| e.message.as_str()) == Some("worker exploded"))
        .collect();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].level, LogLevel::Error);
    assert_eq!(logs[0].error.as_ref().unwrap().name, "Panic");
}
