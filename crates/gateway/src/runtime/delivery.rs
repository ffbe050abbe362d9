//! Mapping turn messages onto stream payloads, and the one-way emitter
//! that carries them to the client.

use cp_domain::stream::StreamPayload;
use cp_domain::tool::Message;
use tokio::sync::mpsc;

use super::machine::Turn;

/// The stream payload for one appended message.
pub fn payload_for(msg: &Message) -> StreamPayload {
    if let Some(error) = msg.error_message() {
        return plain(error.to_string());
    }
    if let Some((_, tool_name, content, _)) = msg.tool_result_part() {
        return StreamPayload::Message {
            content: content.to_string(),
            function_call: false,
            function_name: None,
            arguments: None,
            tool_call: true,
            tool_name: Some(tool_name.to_string()),
        };
    }
    let text = msg.content.text().unwrap_or("").to_string();
    match msg.tool_calls().into_iter().next() {
        Some(call) => StreamPayload::Message {
            content: text,
            function_call: true,
            function_name: Some(call.tool_name),
            arguments: Some(call.arguments),
            tool_call: false,
            tool_name: None,
        },
        None => plain(text),
    }
}

fn plain(content: String) -> StreamPayload {
    StreamPayload::Message {
        content,
        function_call: false,
        function_name: None,
        arguments: None,
        tool_call: false,
        tool_name: None,
    }
}

/// The value-level event that closes a finished turn.
pub fn terminal_payload(turn: &Turn) -> StreamPayload {
    if let Some(error) = turn.error() {
        return StreamPayload::error(error);
    }
    StreamPayload::Values {
        action: None,
        error: None,
        final_answer: Some(turn.answer().unwrap_or("").to_string()),
    }
}

/// Ordered, closable sender for one turn's stream.
///
/// A client that stops reading does not stop the turn: failed sends are
/// ignored. Once [`Delivery::finish`] has run nothing more is sent.
pub struct Delivery {
    tx: mpsc::Sender<StreamPayload>,
    closed: bool,
    sent: usize,
}

impl Delivery {
    pub fn new(tx: mpsc::Sender<StreamPayload>) -> Self {
        Self {
            tx,
            closed: false,
            sent: 0,
        }
    }

    /// Send one payload. Returns false if the stream was already finished.
    pub async fn emit(&mut self, payload: StreamPayload) -> bool {
        if self.closed {
            tracing::debug!("payload dropped after stream end");
            return false;
        }
        if self.tx.send(payload).await.is_err() {
            tracing::trace!("client stopped reading");
        }
        self.sent += 1;
        true
    }

    pub async fn message(&mut self, msg: &Message) -> bool {
        self.emit(payload_for(msg)).await
    }

    /// Send the last payload and close the stream.
    pub async fn finish(&mut self, payload: StreamPayload) {
        self.emit(payload).await;
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Payloads emitted so far.
    pub fn sent(&self) -> usize {
        self.sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_domain::tool::ToolCall;
    use serde_json::json;

    #[test]
    fn call_message_carries_name_and_arguments() {
        let msg = Message::assistant_with_calls(
            "",
            &[ToolCall {
                call_id: "c1".into(),
                tool_name: "publicapi_retriever".into(),
                arguments: json!({"work_mode": "hybrid"}),
            }],
        );
        match payload_for(&msg) {
            StreamPayload::Message { function_call, function_name, arguments, tool_call, .. } => {
                assert!(function_call);
                assert!(!tool_call);
                assert_eq!(function_name.as_deref(), Some("publicapi_retriever"));
                assert_eq!(arguments, Some(json!({"work_mode": "hybrid"})));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn tool_result_is_flagged() {
        let msg = Message::tool_result("c1", "current_events", "Event 1:", false);
        match payload_for(&msg) {
            StreamPayload::Message { content, tool_call, tool_name, function_call, .. } => {
                assert_eq!(content, "Event 1:");
                assert!(tool_call);
                assert!(!function_call);
                assert_eq!(tool_name.as_deref(), Some("current_events"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn terminal_carries_answer_or_error() {
        let mut turn = Turn::new("t", Vec::new(), "hi");
        turn.messages.push(Message::assistant("hello"));
        assert_eq!(
            terminal_payload(&turn),
            StreamPayload::Values { action: None, error: None, final_answer: Some("hello".into()) }
        );

        turn.messages.push(Message::error("model call failed"));
        assert_eq!(terminal_payload(&turn), StreamPayload::error("model call failed"));
    }

    #[tokio::test]
    async fn nothing_is_sent_after_finish() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut out = Delivery::new(tx);
        assert!(out.message(&Message::assistant("a")).await);
        out.finish(StreamPayload::error("done")).await;
        assert!(!out.message(&Message::assistant("late")).await);
        assert!(out.is_closed());
        assert_eq!(out.sent(), 2);
        drop(out);

        let mut received = Vec::new();
        while let Some(p) = rx.recv().await {
            received.push(p);
        }
        assert_eq!(received.len(), 2);
    }

    #[tokio::test]
    async fn departed_client_does_not_stop_emission() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut out = Delivery::new(tx);
        assert!(out.message(&Message::assistant("a")).await);
        assert!(out.message(&Message::assistant("b")).await);
    }
}
