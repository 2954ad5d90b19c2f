/*!
 * Signal Handling Tests
 * Real sigaction registration and self-pipe delivery in this process
 */

use nix::errno::Errno;
use nix::sys::signal::{kill, raise, Signal};
use nix::unistd::getpid;
use pretty_assertions::assert_eq;
use semtester::core::ConsoleLog;
use semtester::signals::{install_handler, signal_stats, SignalRegistrar, SignalSpec, SignalWatcher};
use semtester::{PosixPlatform, SIGNAL_SPECS};
use serial_test::serial;
use std::thread;
use std::time::{Duration, Instant};

fn received_line(signo: i32) -> String {
    format!("{} - Signal {} received", std::process::id(), signo)
}

#[test]
#[serial]
fn test_every_registered_signal_is_observed_once_without_terminating() {
    let watcher = SignalWatcher::install().unwrap();
    for spec in &SIGNAL_SPECS {
        install_handler(spec).unwrap();
    }

    for spec in &SIGNAL_SPECS {
        let before = signal_stats().delivered(spec.number());
        raise(spec.signal).unwrap();
        assert_eq!(
            signal_stats().delivered(spec.number()),
            before + 1,
            "{} delivered once",
            spec.name
        );
    }

    // Still alive after SIGABRT, SIGSEGV and SIGTERM
    let (console, sink) = ConsoleLog::memory();
    watcher.watch(Duration::from_millis(20), &console);

    let expected: Vec<String> = SIGNAL_SPECS
        .iter()
        .map(|spec| received_line(spec.number()))
        .collect();
    assert_eq!(sink.lines(), expected);
}

#[test]
#[serial]
fn test_signal_arriving_mid_wait_is_reported_and_wait_completes() {
    let watcher = SignalWatcher::install().unwrap();
    install_handler(&SIGNAL_SPECS[4]).unwrap();
    let (console, sink) = ConsoleLog::memory();

    let target = getpid();
    let sender = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        kill(target, Signal::SIGTERM).unwrap();
    });

    let started = Instant::now();
    watcher.watch(Duration::from_millis(300), &console);
    sender.join().unwrap();

    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(sink.lines(), vec![received_line(Signal::SIGTERM as i32)]);
}

#[test]
#[serial]
fn test_uncatchable_signal_registration_fails() {
    let err = install_handler(&SignalSpec::new(Signal::SIGKILL, "SIGKILL")).unwrap_err();

    assert_eq!(err.errno(), Some(Errno::EINVAL));
    assert!(err
        .to_string()
        .starts_with(&format!("sigaction(SIGKILL) failed. errno: {} (", Errno::EINVAL as i32)));
}

#[test]
#[serial]
fn test_registrar_continues_past_a_failed_signal() {
    let specs = [
        SIGNAL_SPECS[1],
        SignalSpec::new(Signal::SIGSTOP, "SIGSTOP"),
        SIGNAL_SPECS[4],
    ];
    let registrar = SignalRegistrar::new(&specs);
    let (console, sink) = ConsoleLog::memory();

    let registered = registrar.register_all(&PosixPlatform::new(), &console);

    assert_eq!(registered, 2);
    let lines = sink.lines();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "Registering for signal SIGINT");
    assert_eq!(lines[1], "Registering for signal SIGSTOP");
    assert!(lines[2].starts_with(&format!(
        "{} - sigaction(SIGSTOP) failed. errno: ",
        std::process::id()
    )));
    assert_eq!(lines[3], "Registering for signal SIGTERM");
}
