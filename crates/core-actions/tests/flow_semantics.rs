//! Flow-control semantics: waits, loop pacing, mid-body resume,
//! break/continue, stop scopes.

mod common;

use common::{Harness, block, script, set_v, trigger};

#[test]
fn wait_second_boundaries() {
    let mut h = Harness::new();
    h.spawn(
        "a",
        &script(&[
            trigger(),
            block("w", "wait_second", "[0.5]", ""),
            set_v("s", "1"),
        ]),
    );
    h.run_ticks(29);
    assert_eq!(h.var("v"), "0");
    h.run_ticks(2);
    assert_eq!(h.var("v"), "1");
}

#[test]
fn repeat_basic_paces_one_iteration_per_tick() {
    let mut h = Harness::new();
    h.spawn(
        "a",
        &script(&[
            trigger(),
            block(
                "r",
                "repeat_basic",
                "[3]",
                &block("c", "change_variable", r#"["v",1]"#, ""),
            ),
        ]),
    );
    h.tick();
    assert_eq!(h.var("v"), "1");
    h.tick();
    assert_eq!(h.var("v"), "2");
    h.tick();
    assert_eq!(h.var("v"), "3");
    // Count exhausted: no further growth.
    h.run_ticks(3);
    assert_eq!(h.var("v"), "3");
}

#[test]
fn wait_inside_loop_body_resumes_without_rerunning_the_prefix() {
    let mut h = Harness::new();
    // Each iteration: +1, wait 0.1s, +10. A body prefix re-run would
    // overshoot the +1 contributions.
    let body = [
        block("c1", "change_variable", r#"["v",1]"#, ""),
        block("w", "wait_second", "[0.1]", ""),
        block("c2", "change_variable", r#"["v",10]"#, ""),
    ]
    .join(",");
    h.spawn(
        "a",
        &script(&[trigger(), block("r", "repeat_basic", "[2]", &body)]),
    );
    h.run_ticks(40);
    assert_eq!(h.var("v"), "22");
}

#[test]
fn nested_loops_keep_independent_counters() {
    let mut h = Harness::new();
    let inner = block(
        "inner",
        "repeat_basic",
        "[2]",
        &block("c", "change_variable", r#"["v",1]"#, ""),
    );
    h.spawn(
        "a",
        &script(&[trigger(), block("outer", "repeat_basic", "[3]", &inner)]),
    );
    h.run_ticks(40);
    assert_eq!(h.var("v"), "6");
}

#[test]
fn stop_repeat_ends_the_loop() {
    let mut h = Harness::new();
    let body = [
        block("c", "change_variable", r#"["v",1]"#, ""),
        block(
            "i",
            "_if",
            r#"[{"id":"cmp","type":"boolean_basic_operator","params":[{"id":"g","type":"get_variable","params":["v"]},"GREATER_OR_EQUAL","3"]}]"#,
            &block("s", "stop_repeat", "[]", ""),
        ),
    ]
    .join(",");
    h.spawn(
        "a",
        &script(&[
            trigger(),
            block("r", "repeat_inf", "[]", &body),
            set_v("after", "done"),
        ]),
    );
    h.run_ticks(10);
    assert_eq!(h.var("v"), "done");

    // The loop ran exactly three times before breaking.
    let mut h2 = Harness::new();
    h2.spawn(
        "a",
        &script(&[trigger(), block("r", "repeat_inf", "[]", &body)]),
    );
    h2.run_ticks(10);
    assert_eq!(h2.var("v"), "3");
}

#[test]
fn continue_repeat_still_consumes_a_frame() {
    let mut h = Harness::new();
    // continue_repeat precedes the +10; the +10 must never run, and the
    // loop may only advance one iteration per tick.
    let body = [
        block("c1", "change_variable", r#"["v",1]"#, ""),
        block("k", "continue_repeat", "[]", ""),
        block("c2", "change_variable", r#"["v",10]"#, ""),
    ]
    .join(",");
    h.spawn(
        "a",
        &script(&[trigger(), block("r", "repeat_basic", "[4]", &body)]),
    );
    h.tick();
    // Blocks after continue_repeat still ran this iteration (the flag is
    // checked when the body returns), so one tick adds 11.
    assert_eq!(h.var("v"), "11");
    h.run_ticks(10);
    assert_eq!(h.var("v"), "44");
}

#[test]
fn repeat_while_true_reevaluates_at_loop_top() {
    let mut h = Harness::new();
    let cond = r#"[{"id":"cmp","type":"boolean_basic_operator","params":[{"id":"g","type":"get_variable","params":["v"]},"LESS","3"]}]"#;
    h.spawn(
        "a",
        &script(&[
            trigger(),
            block(
                "r",
                "repeat_while_true",
                cond,
                &block("c", "change_variable", r#"["v",1]"#, ""),
            ),
            set_v("after", "done"),
        ]),
    );
    h.run_ticks(10);
    assert_eq!(h.var("v"), "done");
}

#[test]
fn wait_until_true_polls_once_per_tick() {
    let mut h = Harness::new();
    let cond = r#"[{"id":"cmp","type":"boolean_basic_operator","params":[{"id":"g","type":"get_variable","params":["v"]},"EQUAL","go"]}]"#;
    h.spawn(
        "a",
        &script(&[
            trigger(),
            block("w", "wait_until_true", cond, ""),
            set_v("s", "done"),
        ]),
    );
    h.run_ticks(5);
    assert_eq!(h.var("v"), "0");
    // Flip the condition from outside; the thread passes next tick.
    h.world.vars.resolve_mut("v", "").unwrap().value = core_value::Value::string("go");
    h.run_ticks(1);
    assert_eq!(h.var("v"), "done");
}

#[test]
fn negative_repeat_count_fails_the_thread() {
    let mut h = Harness::new();
    let t = h.spawn(
        "a",
        &script(&[
            trigger(),
            block(
                "r",
                "repeat_basic",
                "[-1]",
                &block("c", "change_variable", r#"["v",1]"#, ""),
            ),
            set_v("s", "unreached"),
        ]),
    );
    h.tick();
    assert_eq!(h.var("v"), "0");
    assert!(!h.thread_alive("a", t));
}

#[test]
fn stop_other_threads_keeps_the_caller() {
    let mut h = Harness::new();
    let looper = h.spawn(
        "a",
        &script(&[
            trigger(),
            block(
                "r",
                "repeat_inf",
                "[]",
                &block("c", "change_variable", r#"["v",1]"#, ""),
            ),
        ]),
    );
    h.spawn(
        "a",
        &script(&[
            trigger(),
            block("s", "stop_object", r#"["otherThreads"]"#, ""),
            set_v("after", "100"),
        ]),
    );
    h.tick();
    // The stopper ran to completion; the looper die at its next turn.
    assert_eq!(h.var("v"), "100");
    h.run_ticks(2);
    assert_eq!(h.var("v"), "100");
    assert!(!h.thread_alive("a", looper));
}

#[test]
fn stop_this_thread_only() {
    let mut h = Harness::new();
    let stopper = h.spawn(
        "a",
        &script(&[
            trigger(),
            block("s", "stop_object", r#"["thisThread"]"#, ""),
            set_v("after", "unreached"),
        ]),
    );
    h.spawn("a", &script(&[trigger(), set_v("other", "ok")]));
    h.run_ticks(2);
    assert_eq!(h.var("v"), "ok");
    assert!(!h.thread_alive("a", stopper));
}

#[test]
fn ask_and_wait_suspends_until_submission() {
    let mut h = Harness::new();
    h.spawn(
        "a",
        &script(&[
            trigger(),
            block("q", "ask_and_wait", r#"["name?"]"#, ""),
            block(
                "s",
                "set_variable",
                r#"["v",{"id":"g","type":"get_canvas_input_value","params":[]}]"#,
                "",
            ),
        ]),
    );
    h.run_ticks(5);
    assert_eq!(h.var("v"), "0");
    let dialog = h.world.entity("a").unwrap().dialog.clone().unwrap();
    assert_eq!(dialog.text, "name?");

    // The input subsystem stores the answer and clears the wait.
    h.world.set_answer("Bob");
    if let Some(state) = h
        .world
        .entity_mut("a")
        .and_then(|e| e.threads.values_mut().next())
    {
        state.clear_wait();
    }
    h.world.entity_mut("a").unwrap().dialog = None;
    h.tick();
    assert_eq!(h.var("v"), "Bob");
}

#[test]
fn project_timer_actions() {
    let mut h = Harness::new();
    h.spawn(
        "a",
        &script(&[
            trigger(),
            block("t1", "choose_project_timer_action", r#"["START"]"#, ""),
        ]),
    );
    h.run_ticks(60);
    let value = h.world.timer.value_ms(h.world.now_ms());
    assert!((950..=1050).contains(&value), "timer at {value}ms");

    h.spawn(
        "a",
        &script(&[
            trigger(),
            block("t2", "choose_project_timer_action", r#"["RESET"]"#, ""),
            block("t3", "choose_project_timer_action", r#"["STOP"]"#, ""),
        ]),
    );
    h.run_ticks(2);
    assert_eq!(h.world.timer.value_ms(h.world.now_ms()), 0);
}
