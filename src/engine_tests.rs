use super::*;
use crate::output_sink::OutputStyle;
use std::sync::mpsc;
use std::time::Duration;

fn engine_with<F>(interpreter: F) -> Arc<ExecutionEngine>
where
    F: Fn(&Script, &ScriptIo) -> Result<(), ScriptFailure> + Send + Sync + 'static,
{
    Arc::new(ExecutionEngine::new(Arc::new(interpreter)))
}

fn run_and_wait(engine: &Arc<ExecutionEngine>, script: Script) -> RunOutcome {
    let (tx, rx) = mpsc::channel();
    engine
        .run_with(script, move |outcome| {
            let _ = tx.send(outcome);
        })
        .unwrap();
    rx.recv_timeout(Duration::from_secs(5)).unwrap()
}

#[test]
fn print_then_input_then_echo() {
    let engine = engine_with(|_script: &Script, io: &ScriptIo| {
        io.print("a\n")?;
        let line = io.read_line("? ")?;
        io.print(&line)?;
        Ok(())
    });

    let (tx, done) = mpsc::channel();
    engine
        .run_with(Script::from_source("echo"), move |outcome| {
            let _ = tx.send(outcome);
        })
        .unwrap();

    let bridge = engine.bridge().expect("bridge bound at run start");
    let prompts = bridge.prompt_events();

    // Prompt arrives strictly after "a" is drainable...
    let prompt = prompts.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(prompt, "? ");
    let (chunks, cursor) = bridge.sink().drain_since(0);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "a\n");
    assert_eq!(chunks[0].style, OutputStyle::Standard);

    // ...and the echoed line only after submission.
    bridge.submit_input("b").unwrap();
    assert_eq!(
        done.recv_timeout(Duration::from_secs(5)).unwrap(),
        RunOutcome::Success
    );
    let (chunks, _) = bridge.sink().drain_since(cursor);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "b\n");
    assert_eq!(chunks[0].style, OutputStyle::Standard);

    assert_eq!(engine.state(), EngineState::Finished(RunOutcome::Success));
}

#[test]
fn failure_preserves_prior_output() {
    let engine = engine_with(|_script: &Script, io: &ScriptIo| {
        io.print("x")?;
        Err(ScriptFailure::new("ZeroDivisionError: division by zero"))
    });

    let outcome = run_and_wait(&engine, Script::from_source("boom"));
    let RunOutcome::Failure(failure) = outcome else {
        panic!("expected failure");
    };
    assert!(failure.message.contains("division by zero"));

    let chunks = engine.bridge().unwrap().sink().snapshot();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "x");
    assert_eq!(chunks[0].style, OutputStyle::Standard);
}

#[test]
fn failure_without_location_carries_originating_path() {
    let engine = engine_with(|_script: &Script, _io: &ScriptIo| Err(ScriptFailure::new("NameError: x")));
    let outcome = run_and_wait(&engine, Script::new("x", "/tmp/broken.py"));

    let RunOutcome::Failure(failure) = outcome else {
        panic!("expected failure");
    };
    assert_eq!(
        failure.path.as_deref(),
        Some(std::path::Path::new("/tmp/broken.py"))
    );
}

#[test]
fn second_run_while_running_is_rejected_without_side_effects() {
    let engine = engine_with(|_script: &Script, io: &ScriptIo| {
        // Park on input so the run stays active while we probe.
        let _ = io.read_line("hold");
        Ok(())
    });

    engine.run(Script::from_source("first")).unwrap();
    let bridge = engine.bridge().unwrap();
    while bridge.pending_prompt().is_none() {
        std::thread::sleep(Duration::from_millis(5));
    }

    assert_eq!(
        engine.run(Script::from_source("second")).unwrap_err(),
        ConsoleError::AlreadyRunning
    );
    // Original run untouched: same bridge, still running, prompt intact.
    assert!(Arc::ptr_eq(&bridge, &engine.bridge().unwrap()));
    assert!(engine.is_running());
    assert_eq!(bridge.pending_prompt().as_deref(), Some("hold"));

    bridge.submit_input("go").unwrap();
}

#[test]
fn engine_is_rerunnable_after_finish() {
    let engine = engine_with(|script: &Script, io: &ScriptIo| {
        io.print(script.source())?;
        Ok(())
    });

    assert_eq!(
        run_and_wait(&engine, Script::from_source("one")),
        RunOutcome::Success
    );
    let first_bridge = engine.bridge().unwrap();

    assert_eq!(
        run_and_wait(&engine, Script::from_source("two")),
        RunOutcome::Success
    );
    let second_bridge = engine.bridge().unwrap();

    // Each run gets a fresh sink/gate pair.
    assert!(!Arc::ptr_eq(&first_bridge, &second_bridge));
    assert_eq!(second_bridge.sink().snapshot()[0].text, "two");
}

#[test]
fn stop_request_interrupts_at_io_checkpoint() {
    let engine = engine_with(|_script: &Script, io: &ScriptIo| {
        loop {
            io.print("tick\n")?;
        }
    });

    let (tx, done) = mpsc::channel();
    engine
        .run_with(Script::from_source("spin"), move |outcome| {
            let _ = tx.send(outcome);
        })
        .unwrap();

    // Let it produce some output, then stop.
    let bridge = engine.bridge().unwrap();
    while bridge.sink().is_empty() {
        std::thread::sleep(Duration::from_millis(5));
    }
    engine.request_stop();

    let outcome = done.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(outcome, RunOutcome::Failure(ScriptFailure::interrupted()));
}

#[test]
fn failed_spawn_leaves_idle_engine_idle() {
    let engine = engine_with(|_s: &Script, _io: &ScriptIo| Ok(()));
    engine.fail_next_spawn();

    let err = engine.run(Script::from_source("doomed")).unwrap_err();
    assert!(matches!(err, ConsoleError::Config(_)));
    assert_eq!(engine.state(), EngineState::Idle);
    assert!(engine.bridge().is_none());

    // Not stuck: the next run proceeds normally.
    assert_eq!(
        run_and_wait(&engine, Script::from_source("ok")),
        RunOutcome::Success
    );
}

#[test]
fn failed_spawn_preserves_previous_finished_run() {
    let engine = engine_with(|script: &Script, io: &ScriptIo| {
        io.print(script.source())?;
        Ok(())
    });
    run_and_wait(&engine, Script::from_source("first"));
    let finished_state = engine.state();
    let finished_bridge = engine.bridge().unwrap();

    engine.fail_next_spawn();
    let err = engine.run(Script::from_source("doomed")).unwrap_err();
    assert!(matches!(err, ConsoleError::Config(_)));

    // The previous run's terminal state and transcript are untouched.
    assert_eq!(engine.state(), finished_state);
    assert!(Arc::ptr_eq(&finished_bridge, &engine.bridge().unwrap()));
    assert_eq!(finished_bridge.sink().snapshot()[0].text, "first");

    assert_eq!(
        run_and_wait(&engine, Script::from_source("second")),
        RunOutcome::Success
    );
}

#[test]
fn stop_request_when_idle_is_noop() {
    let engine = engine_with(|_s: &Script, _io: &ScriptIo| Ok(()));
    engine.request_stop();
    assert_eq!(engine.state(), EngineState::Idle);
}

#[test]
fn link_detection_setting_applies_to_new_runs() {
    let engine = engine_with(|_script: &Script, io: &ScriptIo| {
        io.print("see http://example.com now")?;
        Ok(())
    });
    engine.set_link_detection(false);
    run_and_wait(&engine, Script::from_source("links"));
    assert!(engine.bridge().unwrap().sink().snapshot()[0].links.is_empty());

    engine.set_link_detection(true);
    run_and_wait(&engine, Script::from_source("links"));
    let chunks = engine.bridge().unwrap().sink().snapshot();
    assert_eq!(chunks[0].links.len(), 1);
}
