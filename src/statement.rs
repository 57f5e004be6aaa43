use std::{fmt, sync::Arc};

use crate::{
    decode::{build_request, decode_row_set},
    sql::{extract_table_name, is_select},
    wire::{self, ResponseEnvelope, EXEC_PATH, QUERY_PATH},
    ConnectOptions, DriverError, Params, Result, ResultCursor, Transport, TransportError,
};

/// Update count reported when the last execution was not a successful write.
pub const NO_UPDATE_COUNT: i64 = -1;

/// Reusable handle for submitting SQL and observing its most recent result.
///
/// A statement owns at most one [`ResultCursor`]; every successful execution
/// closes the previous cursor and replaces it. A failed execution leaves the
/// previous cursor and update count in place, so an error means "no new
/// result", not "no result".
pub struct Statement {
    transport: Arc<dyn Transport>,
    options: Arc<ConnectOptions>,
    current_cursor: Option<ResultCursor>,
    current_update_count: i64,
    last_insert_id: Option<i64>,
    max_rows: u64,
    query_timeout: u32,
    closed: bool,
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("options", &self.options)
            .field("current_cursor", &self.current_cursor)
            .field("current_update_count", &self.current_update_count)
            .field("max_rows", &self.max_rows)
            .field("query_timeout", &self.query_timeout)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Statement {
    pub(crate) fn new(transport: Arc<dyn Transport>, options: Arc<ConnectOptions>) -> Self {
        Self {
            transport,
            options,
            current_cursor: None,
            current_update_count: NO_UPDATE_COUNT,
            last_insert_id: None,
            max_rows: 0,
            query_timeout: 0,
            closed: false,
        }
    }

    /// Runs a read statement and returns the cursor over its rows.
    ///
    /// Statements that are not reads are run as updates; the returned cursor
    /// is then the empty cursor left by [`execute_update`](Self::execute_update).
    pub fn execute_query<P: Into<Params>>(
        &mut self,
        sql: &str,
        params: P,
    ) -> Result<&mut ResultCursor> {
        self.ensure_open()?;
        if !is_select(sql) {
            self.execute_update(sql, params)?;
            return Ok(self.current_cursor.get_or_insert_with(ResultCursor::empty));
        }

        let envelope = self.dispatch(QUERY_PATH, sql, params.into())?;
        let data = self.accept(envelope)?.unwrap_or_default();

        let cursor = ResultCursor::new(
            decode_row_set(data),
            self.options.database.as_str(),
            extract_table_name(sql),
            self.max_rows,
        );
        self.current_update_count = NO_UPDATE_COUNT;
        self.last_insert_id = None;
        Ok(self.replace_cursor(cursor))
    }

    /// Runs a write statement.
    ///
    /// Returns the number of statements executed, always `1`; the affected
    /// row count is available from [`update_count`](Self::update_count).
    pub fn execute_update<P: Into<Params>>(&mut self, sql: &str, params: P) -> Result<usize> {
        self.ensure_open()?;
        let envelope = self.dispatch(EXEC_PATH, sql, params.into())?;
        let data = self.accept(envelope)?;

        self.replace_cursor(ResultCursor::empty());
        self.current_update_count = data
            .as_ref()
            .and_then(|data| data.affected_rows)
            .unwrap_or(NO_UPDATE_COUNT);
        self.last_insert_id = data.and_then(|data| data.last_insert_id);
        Ok(1)
    }

    /// Runs any statement through [`execute_query`](Self::execute_query) and
    /// reports whether it was a read.
    pub fn execute<P: Into<Params>>(&mut self, sql: &str, params: P) -> Result<bool> {
        self.execute_query(sql, params)?;
        Ok(is_select(sql))
    }

    /// Cursor left by the last successful execution, if any.
    pub fn result_set(&mut self) -> Option<&mut ResultCursor> {
        self.current_cursor.as_mut()
    }

    /// Affected rows of the last successful write, or [`NO_UPDATE_COUNT`].
    pub fn update_count(&self) -> i64 {
        self.current_update_count
    }

    /// Row id generated by the last successful write, when the adapter reports one.
    pub fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }

    /// Releases the current result. Each execution yields a single result, so
    /// this always returns `false`.
    pub fn more_results(&mut self) -> bool {
        if let Some(mut cursor) = self.current_cursor.take() {
            cursor.close();
            self.current_update_count = NO_UPDATE_COUNT;
            self.last_insert_id = None;
        }
        false
    }

    /// Caps the rows visible through cursors created from now on; `0` means
    /// unlimited. Already open cursors keep their cap.
    pub fn set_max_rows(&mut self, max_rows: i64) -> Result<()> {
        self.max_rows = u64::try_from(max_rows).map_err(|_| {
            DriverError::Validation(format!("illegal max rows value: {max_rows}"))
        })?;
        Ok(())
    }

    pub fn max_rows(&self) -> u64 {
        self.max_rows
    }

    /// Stores the query timeout. Advisory: requests are bounded by the
    /// transport timeout from [`ConnectOptions::timeout_ms`].
    pub fn set_query_timeout(&mut self, seconds: u32) {
        self.query_timeout = seconds;
    }

    pub fn query_timeout(&self) -> u32 {
        self.query_timeout
    }

    /// Closes the statement and its current cursor. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(cursor) = self.current_cursor.as_mut() {
            cursor.close();
        }
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(DriverError::Closed("statement"));
        }
        Ok(())
    }

    fn replace_cursor(&mut self, cursor: ResultCursor) -> &mut ResultCursor {
        if let Some(mut previous) = self.current_cursor.take() {
            #[cfg(feature = "tracing")]
            tracing::trace!(table = previous.table_name(), "closing replaced cursor");
            previous.close();
        }
        self.current_cursor.insert(cursor)
    }

    fn dispatch(&self, path: &str, sql: &str, params: Params) -> Result<ResponseEnvelope> {
        let request = build_request(&self.options.database, sql, params)?;
        let body = serde_json::to_string(&request).map_err(|err| self.fault(err.into()))?;
        let url = format!("{}{path}", self.options.base_url());

        #[cfg(feature = "tracing")]
        tracing::debug!(%url, args = request.args.len(), "dispatching statement");

        let response = self
            .transport
            .post(&url, body)
            .map_err(|err| self.fault(err))?;
        serde_json::from_str(&response).map_err(|err| self.fault(err.into()))
    }

    fn accept(&self, envelope: ResponseEnvelope) -> Result<Option<wire::ResultData>> {
        if envelope.success {
            return Ok(envelope.data);
        }

        #[cfg(feature = "tracing")]
        tracing::warn!(status = %envelope.status, "adapter rejected statement");

        Err(DriverError::Remote {
            status: envelope.status,
            host: self.options.host.clone(),
            port: self.options.port,
        })
    }

    /// Wraps any transport or envelope fault with the adapter endpoint.
    fn fault(&self, source: TransportError) -> DriverError {
        #[cfg(feature = "tracing")]
        tracing::warn!(error = %source, "statement transport fault");

        DriverError::Connection {
            source,
            host: self.options.host.clone(),
            port: self.options.port,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        collections::VecDeque,
        io,
        sync::{Arc, Mutex},
    };

    use serde_json::{json, Value as JsonValue};

    use crate::{
        ConnectOptions, DriverError, Statement, Transport, TransportError, Value, NO_UPDATE_COUNT,
    };

    /// Replays scripted response bodies and records every request.
    pub(crate) struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<String, TransportError>>>,
        pub(crate) requests: Mutex<Vec<(String, JsonValue)>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(replies: Vec<JsonValue>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().map(|body| Ok(body.to_string())).collect()),
                requests: Mutex::default(),
            })
        }

        fn push(&self, reply: Result<String, TransportError>) {
            self.replies.lock().expect("replies mutex").push_back(reply);
        }

        pub(crate) fn request(&self, idx: usize) -> (String, JsonValue) {
            self.requests.lock().expect("requests mutex")[idx].clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn post(&self, url: &str, body: String) -> Result<String, TransportError> {
            let body: JsonValue = serde_json::from_str(&body)?;
            self.requests
                .lock()
                .expect("requests mutex")
                .push((url.to_owned(), body));
            self.replies
                .lock()
                .expect("replies mutex")
                .pop_front()
                .unwrap_or_else(|| {
                    Err(io::Error::new(io::ErrorKind::ConnectionRefused, "no scripted reply").into())
                })
        }
    }

    pub(crate) fn rows_body(rows: usize) -> JsonValue {
        let rows: Vec<JsonValue> = (1..=rows)
            .map(|idx| json!([idx, format!("user{idx}@example.com")]))
            .collect();
        json!({
            "success": true,
            "status": "ok",
            "data": { "columns": ["id", "email"], "types": ["INTEGER", "TEXT"], "rows": rows }
        })
    }

    fn statement(transport: &Arc<ScriptedTransport>) -> Statement {
        Statement::new(
            transport.clone(),
            Arc::new(ConnectOptions::new("db.local", 11105, "e1c4")),
        )
    }

    fn visible_rows(stmt: &mut Statement, sql: &str) -> usize {
        let cursor = stmt.execute_query(sql, ()).expect("query must succeed");
        let mut seen = 0;
        while cursor.advance().expect("must advance") {
            seen += 1;
        }
        seen
    }

    #[test]
    fn query_posts_envelope_to_query_endpoint() {
        let transport = ScriptedTransport::new(vec![rows_body(1)]);
        let mut stmt = statement(&transport);

        let cursor = stmt
            .execute_query("SELECT * FROM `users` WHERE id = ?", [Value::integer(1)])
            .expect("query must succeed");
        assert_eq!(cursor.table_name(), "users");
        assert_eq!(cursor.database(), "e1c4");
        assert!(cursor.advance().expect("must advance"));
        assert_eq!(
            cursor.get("email").expect("column"),
            &Value::text("user1@example.com")
        );

        let (url, body) = transport.request(0);
        assert_eq!(url, "http://db.local:11105/v1/query");
        assert_eq!(
            body,
            json!({"database": "e1c4", "query": "SELECT * FROM `users` WHERE id = ?", "args": [1]})
        );
    }

    #[test]
    fn zero_cap_shows_all_rows() {
        let transport = ScriptedTransport::new(vec![rows_body(5)]);
        let mut stmt = statement(&transport);
        stmt.set_max_rows(0).expect("zero is valid");

        assert_eq!(visible_rows(&mut stmt, "SELECT * FROM users"), 5);
    }

    #[test]
    fn cap_hides_fetched_rows() {
        let transport = ScriptedTransport::new(vec![rows_body(5)]);
        let mut stmt = statement(&transport);
        stmt.set_max_rows(2).expect("two is valid");

        assert_eq!(visible_rows(&mut stmt, "SELECT * FROM users"), 2);
    }

    #[test]
    fn negative_cap_is_rejected_locally() {
        let transport = ScriptedTransport::new(vec![]);
        let mut stmt = statement(&transport);

        let err = stmt.set_max_rows(-1).expect_err("must fail");
        assert!(matches!(err, DriverError::Validation(_)));
        assert_eq!(stmt.max_rows(), 0);
        assert!(transport.requests.lock().expect("requests mutex").is_empty());
    }

    #[test]
    fn cap_is_not_retroactive() {
        let transport = ScriptedTransport::new(vec![rows_body(3)]);
        let mut stmt = statement(&transport);
        stmt.execute_query("SELECT * FROM users", ()).expect("query");
        stmt.set_max_rows(1).expect("valid");

        let cursor = stmt.result_set().expect("cursor must be open");
        assert_eq!(cursor.max_rows(), 0);
    }

    #[test]
    fn update_records_affected_rows_and_leaves_empty_cursor() {
        let transport = ScriptedTransport::new(vec![json!({
            "success": true,
            "data": { "affected_rows": 3, "last_insert_id": 9 }
        })]);
        let mut stmt = statement(&transport);

        let executed = stmt
            .execute_update("DELETE FROM users WHERE id > ?", [Value::integer(2)])
            .expect("update must succeed");

        assert_eq!(executed, 1);
        assert_eq!(stmt.update_count(), 3);
        assert_eq!(stmt.last_insert_id(), Some(9));
        let cursor = stmt.result_set().expect("empty cursor must be defined");
        assert!(!cursor.advance().expect("must advance"));
        assert_eq!(transport.request(0).0, "http://db.local:11105/v1/exec");
    }

    #[test]
    fn update_without_data_reports_no_count() {
        let transport = ScriptedTransport::new(vec![json!({"success": true, "status": "ok"})]);
        let mut stmt = statement(&transport);

        stmt.execute_update("CREATE TABLE t (a INT)", ()).expect("update");
        assert_eq!(stmt.update_count(), NO_UPDATE_COUNT);
    }

    #[test]
    fn query_of_write_runs_as_update() {
        let transport =
            ScriptedTransport::new(vec![json!({"success": true, "data": {"affected_rows": 1}})]);
        let mut stmt = statement(&transport);

        let cursor = stmt
            .execute_query("INSERT INTO users (email) VALUES (?)", [Value::text("a")])
            .expect("write through query path");
        assert!(!cursor.advance().expect("must advance"));
        assert_eq!(stmt.update_count(), 1);
        assert_eq!(transport.request(0).0, "http://db.local:11105/v1/exec");
    }

    #[test]
    fn execute_reports_statement_kind() {
        let transport = ScriptedTransport::new(vec![
            rows_body(1),
            json!({"success": true, "data": {"affected_rows": 2}}),
        ]);
        let mut stmt = statement(&transport);

        assert!(stmt.execute("SHOW TABLES", ()).expect("read"));
        assert!(!stmt.execute("UPDATE users SET email = ''", ()).expect("write"));
        assert_eq!(stmt.update_count(), 2);
    }

    #[test]
    fn query_resets_update_count() {
        let transport = ScriptedTransport::new(vec![
            json!({"success": true, "data": {"affected_rows": 4}}),
            rows_body(1),
        ]);
        let mut stmt = statement(&transport);

        stmt.execute_update("DELETE FROM users", ()).expect("update");
        assert_eq!(stmt.update_count(), 4);
        stmt.execute_query("SELECT * FROM users", ()).expect("query");
        assert_eq!(stmt.update_count(), NO_UPDATE_COUNT);
    }

    #[test]
    fn remote_failure_keeps_previous_result() {
        let transport = ScriptedTransport::new(vec![
            rows_body(2),
            json!({"success": false, "status": "syntax error"}),
            json!({"success": false, "status": "syntax error"}),
        ]);
        let mut stmt = statement(&transport);
        stmt.execute_query("SELECT * FROM users", ())
            .expect("query")
            .advance()
            .expect("must advance");

        let err = stmt
            .execute_query("SELECT * FROM", ())
            .expect_err("must fail");
        assert!(matches!(err, DriverError::Remote { .. }));
        assert!(err.to_string().contains("syntax error"));
        assert_eq!(err.endpoint(), Some(("db.local", 11105)));

        let err = stmt
            .execute_update("DELETE FROM", ())
            .expect_err("must fail");
        assert!(err.to_string().contains("syntax error"));

        // Failed executions do not clear the previous result.
        let cursor = stmt.result_set().expect("previous cursor must survive");
        assert!(!cursor.is_closed());
        assert_eq!(cursor.get("id").expect("still positioned"), &Value::integer(1));
        assert!(cursor.advance().expect("must advance"));
        assert_eq!(stmt.update_count(), NO_UPDATE_COUNT);
    }

    #[test]
    fn failed_update_keeps_previous_update_count() {
        let transport = ScriptedTransport::new(vec![
            json!({"success": true, "data": {"affected_rows": 5}}),
            json!({"success": false, "status": "constraint failed"}),
        ]);
        let mut stmt = statement(&transport);

        stmt.execute_update("UPDATE users SET a = 1", ()).expect("update");
        stmt.execute_update("UPDATE users SET a = NULL", ())
            .expect_err("must fail");
        assert_eq!(stmt.update_count(), 5);
    }

    #[test]
    fn transport_fault_is_wrapped_with_endpoint() {
        let transport = ScriptedTransport::new(vec![]);
        transport.push(Err(
            io::Error::new(io::ErrorKind::ConnectionRefused, "refused").into()
        ));
        let mut stmt = statement(&transport);

        let err = stmt
            .execute_query("SELECT 1", ())
            .expect_err("must fail");
        match err {
            DriverError::Connection { source, host, port } => {
                assert!(matches!(source, TransportError::Io(_)));
                assert_eq!((host.as_str(), port), ("db.local", 11105));
            }
            other => panic!("expected connection error, got {other:?}"),
        }
    }

    #[test]
    fn connection_faults_keep_previous_state() {
        let transport =
            ScriptedTransport::new(vec![json!({"success": true, "data": {"affected_rows": 5}})]);
        let refused = || -> Result<String, TransportError> {
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused").into())
        };
        let garbage = || -> Result<String, TransportError> { Ok("<html>502</html>".to_owned()) };
        transport.push(refused());
        transport.push(garbage());
        transport.push(Ok(rows_body(2).to_string()));
        transport.push(refused());
        transport.push(garbage());
        let mut stmt = statement(&transport);

        stmt.execute_update("UPDATE users SET a = 1", ()).expect("update");
        for _ in 0..2 {
            let err = stmt
                .execute_update("UPDATE users SET a = 2", ())
                .expect_err("must fail");
            assert!(matches!(err, DriverError::Connection { .. }));
        }
        assert_eq!(stmt.update_count(), 5);
        let cursor = stmt.result_set().expect("empty cursor must survive");
        assert!(!cursor.is_closed());
        assert!(cursor.columns().expect("open").is_empty());

        stmt.execute_query("SELECT * FROM users", ())
            .expect("query")
            .advance()
            .expect("must advance");
        for _ in 0..2 {
            let err = stmt
                .execute_query("SELECT * FROM users", ())
                .expect_err("must fail");
            assert!(matches!(err, DriverError::Connection { .. }));
        }
        assert_eq!(stmt.update_count(), NO_UPDATE_COUNT);
        let cursor = stmt.result_set().expect("previous cursor must survive");
        assert!(!cursor.is_closed());
        assert_eq!(cursor.get("id").expect("still positioned"), &Value::integer(1));
        assert!(cursor.advance().expect("must advance"));
        assert_eq!(cursor.get("id").expect("second row"), &Value::integer(2));
    }

    #[test]
    fn malformed_body_is_connection_error() {
        let transport = ScriptedTransport::new(vec![]);
        transport.push(Ok("<html>bad gateway</html>".to_owned()));
        let mut stmt = statement(&transport);

        let err = stmt.execute_update("DELETE FROM t", ()).expect_err("must fail");
        assert!(matches!(
            err,
            DriverError::Connection {
                source: TransportError::Json(_),
                ..
            }
        ));
    }

    #[test]
    fn non_finite_parameter_never_reaches_transport() {
        let transport = ScriptedTransport::new(vec![]);
        let mut stmt = statement(&transport);

        let err = stmt
            .execute_update("INSERT INTO t VALUES (?)", [Value::float(f64::INFINITY)])
            .expect_err("must fail");
        assert!(matches!(err, DriverError::Validation(_)));
        assert!(transport.requests.lock().expect("requests mutex").is_empty());
    }

    #[test]
    fn new_query_closes_replaced_cursor() {
        let transport = ScriptedTransport::new(vec![rows_body(2), rows_body(1)]);
        let mut stmt = statement(&transport);

        stmt.execute_query("SELECT * FROM a", ()).expect("first");
        let cursor = stmt.execute_query("SELECT * FROM b", ()).expect("second");
        assert_eq!(cursor.table_name(), "b");
        assert!(!cursor.is_closed());
    }

    #[test]
    fn more_results_releases_cursor() {
        let transport = ScriptedTransport::new(vec![json!({
            "success": true,
            "data": { "affected_rows": 3 }
        })]);
        let mut stmt = statement(&transport);
        assert!(!stmt.more_results());

        stmt.execute_update("DELETE FROM users", ()).expect("update");
        assert!(!stmt.more_results());
        assert!(stmt.result_set().is_none());
        assert_eq!(stmt.update_count(), NO_UPDATE_COUNT);
    }

    #[test]
    fn query_timeout_is_stored() {
        let transport = ScriptedTransport::new(vec![]);
        let mut stmt = statement(&transport);
        assert_eq!(stmt.query_timeout(), 0);
        stmt.set_query_timeout(30);
        assert_eq!(stmt.query_timeout(), 30);
    }

    #[test]
    fn closed_statement_rejects_execution() {
        let transport = ScriptedTransport::new(vec![rows_body(1)]);
        let mut stmt = statement(&transport);
        stmt.execute_query("SELECT * FROM users", ()).expect("query");

        stmt.close();
        stmt.close();

        assert!(stmt.is_closed());
        let cursor = stmt.result_set().expect("cursor reference is kept");
        assert!(matches!(cursor.advance(), Err(DriverError::Closed(_))));
        assert!(matches!(
            stmt.execute_query("SELECT 1", ()),
            Err(DriverError::Closed("statement"))
        ));
    }
}
