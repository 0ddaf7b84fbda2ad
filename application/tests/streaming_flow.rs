//! Sequential-streaming executor tests: token ordering, tool streaming,
//! and the ReAct agent loop.

mod common;

use std::sync::Arc;

use council_application::{ExecuteRound, RoundContext, SequentialRoundExecutor};
use council_domain::{CouncilEvent, GatewayEvent, RoundKind};

use common::{event_channel, settings, Script, StubGateway, StubTools};

fn token(content: &str) -> GatewayEvent {
    GatewayEvent::Token {
        content: content.to_string(),
    }
}

#[tokio::test]
async fn tokens_never_interleave_across_participants() {
    let gateway = StubGateway::new()
        .script(
            "p1",
            Script::Stream(vec![token("alpha "), token("beta"), GatewayEvent::done("")]),
        )
        .script(
            "p2",
            Script::Stream(vec![token("gamma"), GatewayEvent::done("")]),
        );

    let executor = SequentialRoundExecutor::new(
        Arc::new(gateway),
        Arc::new(StubTools::new()),
        settings(&["p1", "p2"], "d/chair"),
    );

    let (events, collector) = event_channel();
    let record = executor
        .execute_round(2, RoundKind::Critique, "Q?", &RoundContext::for_critique(vec![]), &events)
        .await
        .unwrap();
    drop(events);
    let events = collector.await.unwrap();

    // Submission order preserved
    let models: Vec<_> = record.participants().map(|m| m.as_str()).collect();
    assert_eq!(models, vec!["p1", "p2"]);

    // No p2 token before p1's model_complete
    let p1_complete = events
        .iter()
        .position(|e| {
            matches!(e, CouncilEvent::ModelComplete { model, .. } if model.as_str() == "p1")
        })
        .expect("p1 completes");
    for (i, event) in events.iter().enumerate() {
        if let CouncilEvent::Token { model: Some(model), .. } = event {
            if model.as_str() == "p2" {
                assert!(i > p1_complete, "p2 token at {i} before p1 complete");
            }
        }
    }

    assert_eq!(record.responses[0].content, "alpha beta");
}

#[tokio::test]
async fn stream_error_yields_model_error_and_no_complete() {
    let gateway = StubGateway::new()
        .script(
            "p1",
            Script::Stream(vec![token("starts fine"), GatewayEvent::error("connection reset")]),
        )
        .script("p2", Script::Stream(vec![token("ok"), GatewayEvent::done("")]));

    let executor = SequentialRoundExecutor::new(
        Arc::new(gateway),
        Arc::new(StubTools::new()),
        settings(&["p1", "p2"], "d/chair"),
    );

    let (events, collector) = event_channel();
    let record = executor
        .execute_round(2, RoundKind::Critique, "Q?", &RoundContext::for_critique(vec![]), &events)
        .await
        .unwrap();
    drop(events);
    let events = collector.await.unwrap();

    // p1 fails, p2 carries the round
    assert_eq!(record.responses.len(), 1);
    assert_eq!(record.responses[0].model.as_str(), "p2");

    let p1_events: Vec<_> = events
        .iter()
        .filter(|e| {
            matches!(e, CouncilEvent::ModelComplete { model, .. } if model.as_str() == "p1")
                || matches!(e, CouncilEvent::ModelError { model, .. } if model.as_str() == "p1")
        })
        .collect();
    assert_eq!(p1_events.len(), 1);
    assert!(matches!(p1_events[0], CouncilEvent::ModelError { .. }));
}

#[tokio::test]
async fn streaming_tool_loop_merges_fragments_and_executes() {
    // Fragmented tool call over the wire, then a second stream with the
    // final answer.
    let gateway = StubGateway::new()
        .script(
            "p1",
            Script::Stream(vec![
                GatewayEvent::ToolCallFragment {
                    index: 0,
                    id: Some("call_7".into()),
                    name: Some("search_web".into()),
                    arguments: "{\"query\": \"rust 1".into(),
                },
                GatewayEvent::ToolCallFragment {
                    index: 0,
                    id: None,
                    name: None,
                    arguments: ".80 release\"}".into(),
                },
                GatewayEvent::done(""),
            ]),
        )
        .script(
            "p1",
            Script::Stream(vec![token("It was released in 2024."), GatewayEvent::done("")]),
        )
        .script("p2", Script::Stream(vec![token("no tools used"), GatewayEvent::done("")]));

    let tools = Arc::new(StubTools::new());
    let executor = SequentialRoundExecutor::new(
        Arc::new(gateway),
        Arc::clone(&tools) as Arc<dyn council_application::ToolExecutorPort>,
        settings(&["p1", "p2"], "d/chair"),
    );

    let (events, collector) = event_channel();
    let record = executor
        .execute_round(1, RoundKind::Initial, "Q?", &RoundContext::empty(), &events)
        .await
        .unwrap();
    drop(events);
    let events = collector.await.unwrap();

    // The merged arguments reached the executor intact
    let calls = tools.recorded();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1["query"], "rust 1.80 release");

    // tool_call precedes tool_result
    let call_pos = events
        .iter()
        .position(|e| matches!(e, CouncilEvent::ToolCall { .. }))
        .unwrap();
    let result_pos = events
        .iter()
        .position(|e| matches!(e, CouncilEvent::ToolResult { .. }))
        .unwrap();
    assert!(call_pos < result_pos);

    let p1 = &record.responses[0];
    assert_eq!(p1.content, "It was released in 2024.");
    assert_eq!(p1.tool_calls_made.len(), 1);
}

#[tokio::test]
async fn react_turn_emits_reasoning_events_in_order() {
    // The model searches, observes, then responds.
    let gateway = StubGateway::new()
        .script(
            "p1",
            Script::Stream(vec![
                token("Thought: need latest rate.\nAction: search_web(\"usd to eur today\")"),
                GatewayEvent::done(""),
            ]),
        )
        .script(
            "p1",
            Script::Stream(vec![
                token("Thought: found it.\nAction: respond()\nThe rate is about 0.92."),
                GatewayEvent::done(""),
            ]),
        );

    let tools = Arc::new(StubTools::new());
    let executor = SequentialRoundExecutor::new(
        Arc::new(gateway),
        Arc::clone(&tools) as Arc<dyn council_application::ToolExecutorPort>,
        settings(&["p1"], "d/chair").with_react(true),
    );

    let (events, collector) = event_channel();
    let record = executor
        .execute_round(1, RoundKind::Initial, "usd to eur?", &RoundContext::empty(), &events)
        .await
        .unwrap();
    drop(events);
    let events = collector.await.unwrap();

    let response = &record.responses[0];
    assert_eq!(response.content, "The rate is about 0.92.");
    assert_eq!(response.reasoned, Some(true));
    assert_eq!(response.tool_calls_made.len(), 1);

    // Expected shape: model_start, token*, thought, action(search_web),
    // tool_call, tool_result, observation, token*, thought, action(respond),
    // model_complete, round_complete.
    let positions = |pred: &dyn Fn(&CouncilEvent) -> bool| -> usize {
        events.iter().position(|e| pred(e)).expect("event present")
    };
    let first_thought = positions(&|e| {
        matches!(e, CouncilEvent::Thought { text, .. } if text == "need latest rate.")
    });
    let search_action = positions(&|e| {
        matches!(e, CouncilEvent::Action { name, arg, .. }
            if name == "search_web" && arg.as_deref() == Some("usd to eur today"))
    });
    let observation = positions(&|e| matches!(e, CouncilEvent::Observation { .. }));
    let respond_action = positions(&|e| {
        matches!(e, CouncilEvent::Action { name, arg, .. } if name == "respond" && arg.is_none())
    });
    let complete = positions(&|e| matches!(e, CouncilEvent::ModelComplete { .. }));
    let round_complete = positions(&|e| matches!(e, CouncilEvent::RoundComplete { .. }));

    assert!(first_thought < search_action);
    assert!(search_action < observation);
    assert!(observation < respond_action);
    assert!(respond_action < complete);
    assert!(complete < round_complete);

    // The observation text fed back to the model matches the tool result
    let observation_text = events.iter().find_map(|e| match e {
        CouncilEvent::Observation { text, .. } => Some(text.clone()),
        _ => None,
    });
    assert!(observation_text.unwrap().contains("usd to eur today"));
}

#[tokio::test]
async fn react_cap_forces_final_answer() {
    // Three search rounds without a terminal action, then the forced pass.
    let search_step = || {
        Script::Stream(vec![
            token("Thought: still unsure.\nAction: search_web(\"more\")"),
            GatewayEvent::done(""),
        ])
    };
    let gateway = StubGateway::new()
        .script("p1", search_step())
        .script("p1", search_step())
        .script("p1", search_step())
        .script(
            "p1",
            Script::Stream(vec![token("Final answer after cap."), GatewayEvent::done("")]),
        );

    let tools = Arc::new(StubTools::new());
    let executor = SequentialRoundExecutor::new(
        Arc::new(gateway),
        Arc::clone(&tools) as Arc<dyn council_application::ToolExecutorPort>,
        settings(&["p1"], "d/chair").with_react(true),
    );

    let (events, collector) = event_channel();
    let record = executor
        .execute_round(1, RoundKind::Initial, "Q?", &RoundContext::empty(), &events)
        .await
        .unwrap();
    drop(events);
    collector.await.unwrap();

    assert_eq!(record.responses[0].content, "Final answer after cap.");
    assert_eq!(tools.recorded().len(), 3);
}

#[tokio::test]
async fn react_plain_content_terminates_loop() {
    let gateway = StubGateway::new().script(
        "p1",
        Script::Stream(vec![
            token("Paris is the capital of France."),
            GatewayEvent::done(""),
        ]),
    );

    let executor = SequentialRoundExecutor::new(
        Arc::new(gateway),
        Arc::new(StubTools::new()),
        settings(&["p1"], "d/chair").with_react(true),
    );

    let (events, collector) = event_channel();
    let record = executor
        .execute_round(1, RoundKind::Initial, "capital of France?", &RoundContext::empty(), &events)
        .await
        .unwrap();
    drop(events);
    collector.await.unwrap();

    assert_eq!(record.responses[0].content, "Paris is the capital of France.");
    assert!(record.responses[0].tool_calls_made.is_empty());
}
