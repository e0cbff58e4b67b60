//! # Dispatch Engine
//!
//! Owns the registry, the call context, the storage collaborators and the
//! rollup channel, and runs the common envelope around every handler.
//!
//! ## Advance
//!
//! ```text
//! route (caller, then selector) → begin → activate context → decode
//!     → invoke → Accept: index input, commit, flush
//!              → Reject: rollback
//!              → Err:    rollback, error report
//!     → clear context
//! ```
//!
//! A failed flush leaves committed state that is not durable. The engine
//! then halts: that call and every later input end in
//! [`CallOutcome::Halted`].
//!
//! ## Inspect
//!
//! ```text
//! detect format → resolve route → bind params → begin → activate
//!     → invoke → rollback (always) → clear context
//! ```
//!
//! Recoverable errors never escape: each ends in a single diagnostic report
//! and a [`CallOutcome::Failed`].

use crate::builtins::{register_indexer, register_relay, INDEXER_MODULE, RELAY_MODULE};
use crate::call::Call;
use crate::domain::{
    CallContext, CallOutcome, CallStatus, ContextGuard, EngineConfig, EngineStats, ModuleSettings,
    RouteConfig, RouteInfo, RouteKey, RouteKind,
};
use crate::errors::{ConfigurationError, DispatchError, ErrorKind};
use crate::ports::{KeyValueStore, RollupApp, RollupChannel};
use crate::registry::{Registration, Registry};
use rd_01_abi_codec::prelude::{AbiPayload, Payload, PayloadDescriptor};
use rd_02_query_codec::prelude::{
    codes, encode_json_query, encode_jsonrpc_query, encode_url_query, ParamBag, QueryError,
    QueryFormat, RpcResponse, StructuredRequest, UrlQuery,
};
use rd_03_output_index::prelude::{IndexEntry, IndexStore};
use serde_json::Value;
use shared_types::{Address, BlockMetadata, OutputKind, MAX_OUTPUT_SIZE};
use tracing::{debug, error, info, warn};

// =============================================================================
// BUILDER
// =============================================================================

/// Collects registrations, then validates the whole wiring in [`build`].
///
/// [`build`]: DispatchEngineBuilder::build
#[derive(Debug)]
pub struct DispatchEngineBuilder {
    config: EngineConfig,
    registry: Registry,
}

impl DispatchEngineBuilder {
    /// Starts wiring with `config`.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            registry: Registry::new(),
        }
    }

    /// Registers a mutation taking an untyped payload (`None` when
    /// `descriptor` is `None`).
    pub fn register_mutation<F>(
        mut self,
        module: &str,
        method: &str,
        descriptor: Option<PayloadDescriptor>,
        config: RouteConfig,
        handler: F,
    ) -> Result<Self, ConfigurationError>
    where
        F: Fn(&mut Call<'_>, Option<Payload>) -> Result<CallStatus, DispatchError> + 'static,
    {
        self.registry.register(
            RouteKind::Mutation,
            module,
            method,
            descriptor,
            config,
            Box::new(handler),
        )?;
        Ok(self)
    }

    /// Registers a query taking an untyped payload.
    pub fn register_query<F>(
        mut self,
        module: &str,
        method: &str,
        descriptor: Option<PayloadDescriptor>,
        config: RouteConfig,
        handler: F,
    ) -> Result<Self, ConfigurationError>
    where
        F: Fn(&mut Call<'_>, Option<Payload>) -> Result<CallStatus, DispatchError> + 'static,
    {
        self.registry.register(
            RouteKind::Query,
            module,
            method,
            descriptor,
            config,
            Box::new(handler),
        )?;
        Ok(self)
    }

    /// Registers a mutation over a typed payload.
    pub fn register_typed_mutation<P, F>(
        self,
        module: &str,
        method: &str,
        config: RouteConfig,
        handler: F,
    ) -> Result<Self, ConfigurationError>
    where
        P: AbiPayload + 'static,
        F: Fn(&mut Call<'_>, P) -> Result<CallStatus, DispatchError> + 'static,
    {
        self.register_mutation(module, method, Some(P::descriptor()), config, typed(handler))
    }

    /// Registers a query over a typed payload.
    pub fn register_typed_query<P, F>(
        self,
        module: &str,
        method: &str,
        config: RouteConfig,
        handler: F,
    ) -> Result<Self, ConfigurationError>
    where
        P: AbiPayload + 'static,
        F: Fn(&mut Call<'_>, P) -> Result<CallStatus, DispatchError> + 'static,
    {
        self.register_query(module, method, Some(P::descriptor()), config, typed(handler))
    }

    /// Adds the built-in routes and validates the configuration against
    /// the registered modules.
    pub fn build<S, I, R>(
        mut self,
        store: S,
        index: I,
        rollup: R,
    ) -> Result<DispatchEngine<S, I, R>, ConfigurationError>
    where
        S: KeyValueStore,
        I: IndexStore,
        R: RollupChannel,
    {
        self.config.validate()?;
        if self.config.enable_relay {
            register_relay(&mut self.registry, self.config.relay_address)?;
        }
        if self.config.indexing_enabled() {
            register_indexer(&mut self.registry)?;
        }
        let modules = self.registry.modules();
        for settings in &self.config.modules {
            let name = settings.name.as_str();
            if !modules.contains(name) && name != RELAY_MODULE && name != INDEXER_MODULE {
                return Err(ConfigurationError::UnknownModuleSettings(settings.name.clone()));
            }
        }
        let app_contract = index.app_contract();
        info!(
            routes = self.registry.len(),
            relay = self.config.enable_relay,
            indexing = self.config.indexing_enabled(),
            app_contract = ?app_contract,
            "[rd-04] dispatch engine ready"
        );
        Ok(DispatchEngine {
            registry: self.registry,
            config: self.config,
            core: EngineCore {
                ctx: CallContext::default(),
                store,
                index,
                rollup,
                stats: EngineStats::default(),
                app_contract,
                backfilled: app_contract.is_some(),
                halted: None,
            },
        })
    }
}

fn typed<P, F>(
    handler: F,
) -> impl Fn(&mut Call<'_>, Option<Payload>) -> Result<CallStatus, DispatchError> + 'static
where
    P: AbiPayload + 'static,
    F: Fn(&mut Call<'_>, P) -> Result<CallStatus, DispatchError> + 'static,
{
    move |call: &mut Call<'_>, payload: Option<Payload>| {
        let payload = payload.ok_or_else(|| DispatchError::Decode("missing payload".into()))?;
        let value = P::from_payload(&payload)?;
        handler(call, value)
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// The dispatcher.
pub struct DispatchEngine<S, I, R> {
    registry: Registry,
    config: EngineConfig,
    core: EngineCore<S, I, R>,
}

/// Everything a call mutates. Kept apart from the registry so a
/// registration can be borrowed while the call runs.
struct EngineCore<S, I, R> {
    ctx: CallContext,
    store: S,
    index: I,
    rollup: R,
    stats: EngineStats,
    app_contract: Option<Address>,
    backfilled: bool,
    halted: Option<String>,
}

/// A query resolved to its route, with bound parameters.
struct ResolvedQuery<'r> {
    route: &'r Registration,
    payload: Option<Payload>,
    extended: Option<Payload>,
    rpc_id: Option<Value>,
}

impl DispatchEngine<(), (), ()> {
    /// Starts wiring an engine.
    #[must_use]
    pub fn builder(config: EngineConfig) -> DispatchEngineBuilder {
        DispatchEngineBuilder::new(config)
    }
}

impl<S, I, R> DispatchEngine<S, I, R>
where
    S: KeyValueStore,
    I: IndexStore,
    R: RollupChannel,
{
    // =========================================================================
    // ADVANCE
    // =========================================================================

    /// Handles one state-changing input.
    pub fn advance(&mut self, metadata: BlockMetadata, payload: &[u8]) -> CallOutcome {
        let input_index = metadata.input_index;
        debug!(
            input_index,
            sender = %metadata.msg_sender,
            bytes = payload.len(),
            "[rd-04] advance received"
        );
        if let Some(outcome) = self.core.refuse_if_halted() {
            return outcome;
        }
        if self.core.app_contract.is_none() {
            if let Some(app) = metadata.app_contract {
                info!(app_contract = %app, "[rd-04] application contract learned from metadata");
                self.core.app_contract = Some(app);
            }
        }

        let outcome = match route_advance(&self.registry, &metadata, payload) {
            None => {
                warn!(
                    input_index,
                    sender = %metadata.msg_sender,
                    "[rd-04] no route accepts this advance input"
                );
                CallOutcome::Rejected
            }
            Some(route) => {
                let settings = self.config.settings_for(&route.key.module).clone();
                match self.core.execute_advance(route, settings.clone(), metadata.clone(), payload) {
                    Ok(CallStatus::Accept) => CallOutcome::Accepted,
                    Ok(CallStatus::Reject) => CallOutcome::Rejected,
                    Err(e) if e.is_fatal() => self.core.halt(&e),
                    Err(e) => {
                        let kind = e.kind();
                        error!(
                            route = %route.key,
                            input_index,
                            kind = %kind,
                            error = %e,
                            "[rd-04] advance failed"
                        );
                        self.core.emit_error_report(
                            &route.key.module,
                            &settings,
                            Some(&metadata),
                            e.to_string().into_bytes(),
                        );
                        self.core.stats.errors += 1;
                        CallOutcome::Failed {
                            kind,
                            message: e.to_string(),
                        }
                    }
                }
            }
        };

        let outcome = match &self.core.halted {
            Some(message) if !outcome.is_halted() => CallOutcome::Halted {
                message: message.clone(),
            },
            _ => outcome,
        };
        if outcome.is_accepted() {
            self.core.stats.advances_accepted += 1;
        } else {
            self.core.stats.advances_rejected += 1;
        }
        info!(input_index, status = ?outcome.status(), "[rd-04] advance finished");
        outcome
    }

    // =========================================================================
    // INSPECT
    // =========================================================================

    /// Handles one read-only query.
    pub fn inspect(&mut self, payload: &[u8]) -> CallOutcome {
        let format = QueryFormat::detect(payload);
        debug!(format = %format, bytes = payload.len(), "[rd-04] inspect received");
        if let Some(outcome) = self.core.refuse_if_halted() {
            return outcome;
        }

        let outcome = match resolve_query(&self.registry, &self.config, format, payload) {
            Err(e) => {
                warn!(format = %format, error = %e, "[rd-04] inspect rejected");
                let body = if format == QueryFormat::JsonRpc {
                    let id = StructuredRequest::peek_id(payload).unwrap_or(Value::Null);
                    RpcResponse::from_query_error(id, &e).to_bytes()
                } else {
                    e.to_string().into_bytes()
                };
                self.core
                    .emit_error_report("", &ModuleSettings::default(), None, body);
                self.core.stats.errors += 1;
                CallOutcome::Failed {
                    kind: ErrorKind::Decode,
                    message: e.to_string(),
                }
            }
            Ok(query) => {
                let route = query.route;
                let settings = self.config.settings_for(&route.key.module).clone();
                let rpc_id = query.rpc_id.clone();
                let (result, reported) = self.core.execute_inspect(query, settings.clone());
                match result {
                    Ok(CallStatus::Accept) => CallOutcome::Accepted,
                    Ok(CallStatus::Reject) => CallOutcome::Rejected,
                    Err(e) => {
                        let kind = e.kind();
                        error!(route = %route.key, kind = %kind, error = %e, "[rd-04] inspect failed");
                        if !reported {
                            let body = match rpc_id {
                                Some(id) => RpcResponse::error(id, rpc_code(&e), e.to_string()).to_bytes(),
                                None => e.to_string().into_bytes(),
                            };
                            self.core
                                .emit_error_report(&route.key.module, &settings, None, body);
                        }
                        self.core.stats.errors += 1;
                        CallOutcome::Failed {
                            kind,
                            message: e.to_string(),
                        }
                    }
                }
            }
        };

        if outcome.is_accepted() {
            self.core.stats.inspects_accepted += 1;
        } else {
            self.core.stats.inspects_rejected += 1;
        }
        debug!(status = ?outcome.status(), "[rd-04] inspect finished");
        outcome
    }

    // =========================================================================
    // CLIENT-SIDE ENCODING
    // =========================================================================

    /// Encodes an advance payload for `module.method`: header (unless the
    /// route is header-less), optional proxy address, then the tuple.
    pub fn encode_mutation_input(
        &self,
        module: &str,
        method: &str,
        proxy: Option<Address>,
        payload: &Payload,
    ) -> Result<Vec<u8>, DispatchError> {
        let key = RouteKey::new(module, method);
        let route = self
            .registry
            .get(&key)
            .filter(|r| r.kind == RouteKind::Mutation)
            .ok_or_else(|| DispatchError::handler(format!("unknown mutation {key}")))?;
        Ok(route.encode_input(proxy, payload)?)
    }

    /// Encodes an inspect payload for `module.method` in the module's
    /// query format. `id` is used by JSON-RPC modules only.
    pub fn encode_query(
        &self,
        module: &str,
        method: &str,
        payload: &Payload,
        id: u64,
    ) -> Result<Vec<u8>, DispatchError> {
        let key = RouteKey::new(module, method);
        let route = self
            .registry
            .get(&key)
            .filter(|r| r.kind == RouteKind::Query)
            .ok_or_else(|| DispatchError::handler(format!("unknown query {key}")))?;
        let text = match self.config.settings_for(&key.module).query_format {
            QueryFormat::Url => {
                encode_url_query(&key.module, &key.method, &route.config.path_params, payload)?
            }
            QueryFormat::Json => encode_json_query(&key.module, &key.method, payload),
            QueryFormat::JsonRpc => {
                let empty = PayloadDescriptor::empty();
                let shape = route
                    .extended
                    .as_ref()
                    .or(route.descriptor.as_ref())
                    .unwrap_or(&empty);
                encode_jsonrpc_query(&key.module, &key.method, shape, payload, id)
            }
        };
        Ok(text.into_bytes())
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Every registration with its wire identity.
    #[must_use]
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.registry.iter().map(Registration::info).collect()
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Application state store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.core.store
    }

    /// Output index.
    #[must_use]
    pub fn index(&self) -> &I {
        &self.core.index
    }

    /// Rollup channel.
    #[must_use]
    pub fn rollup(&self) -> &R {
        &self.core.rollup
    }

    /// Mutable rollup channel (for draining recorded outputs).
    pub fn rollup_mut(&mut self) -> &mut R {
        &mut self.core.rollup
    }

    /// Counters since the engine was built.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.core.stats
    }

    /// Cause of the halt, once a flush has failed.
    #[must_use]
    pub fn halted(&self) -> Option<&str> {
        self.core.halted.as_deref()
    }

    /// Application contract, once known.
    #[must_use]
    pub fn app_contract(&self) -> Option<Address> {
        self.core.app_contract
    }
}

impl<S, I, R> RollupApp for DispatchEngine<S, I, R>
where
    S: KeyValueStore,
    I: IndexStore,
    R: RollupChannel,
{
    fn advance(&mut self, metadata: BlockMetadata, payload: &[u8]) -> CallOutcome {
        DispatchEngine::advance(self, metadata, payload)
    }

    fn inspect(&mut self, payload: &[u8]) -> CallOutcome {
        DispatchEngine::inspect(self, payload)
    }
}

// =============================================================================
// ROUTING
// =============================================================================

/// Header-less routes are selected by caller first; otherwise by the
/// 4-byte header. A caller filter that does not match rejects the input.
fn route_advance<'r>(
    registry: &'r Registry,
    metadata: &BlockMetadata,
    payload: &[u8],
) -> Option<&'r Registration> {
    let route = registry
        .by_sender(&metadata.msg_sender)
        .or_else(|| payload.get(..4).and_then(|header| registry.by_selector(header)))?;
    match route.config.msg_sender {
        Some(allowed) if allowed != metadata.msg_sender => {
            warn!(
                route = %route.key,
                sender = %metadata.msg_sender,
                %allowed,
                "[rd-04] caller not allowed"
            );
            None
        }
        _ => Some(route),
    }
}

fn resolve_query<'r>(
    registry: &'r Registry,
    config: &EngineConfig,
    format: QueryFormat,
    payload: &[u8],
) -> Result<ResolvedQuery<'r>, QueryError> {
    let (route, bag, rpc_id) = match format {
        QueryFormat::Url => {
            let query = UrlQuery::parse(payload)?;
            let key = RouteKey::new(query.module(), query.method());
            let route = registry
                .get(&key)
                .filter(|r| r.kind == RouteKind::Query)
                .ok_or_else(|| QueryError::MethodNotFound(key.to_string()))?;
            check_format(config, route, format)?;
            (route, query.into_params(&route.config.path_params)?, None)
        }
        QueryFormat::Json | QueryFormat::JsonRpc => {
            let request = StructuredRequest::parse(payload, format == QueryFormat::JsonRpc)?;
            let route = registry
                .by_method(&request.method)
                .ok_or_else(|| QueryError::MethodNotFound(request.method.clone()))?;
            check_format(config, route, format)?;
            let empty = PayloadDescriptor::empty();
            let shape = route
                .extended
                .as_ref()
                .or(route.descriptor.as_ref())
                .unwrap_or(&empty);
            (route, request.params.to_bag(shape)?, request.id)
        }
    };
    Ok(ResolvedQuery {
        route,
        payload: bind(&bag, route.descriptor.as_ref())?,
        extended: bind(&bag, route.extended.as_ref())?,
        rpc_id,
    })
}

fn bind(bag: &ParamBag, descriptor: Option<&PayloadDescriptor>) -> Result<Option<Payload>, QueryError> {
    descriptor.map(|d| bag.bind(d)).transpose()
}

fn check_format(
    config: &EngineConfig,
    route: &Registration,
    actual: QueryFormat,
) -> Result<(), QueryError> {
    let expected = config.settings_for(&route.key.module).query_format;
    if expected == actual {
        Ok(())
    } else {
        Err(QueryError::FormatMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}

fn rpc_code(e: &DispatchError) -> i32 {
    match e.kind() {
        ErrorKind::Decode => codes::INVALID_PARAMS,
        _ => codes::INTERNAL_ERROR,
    }
}

// =============================================================================
// CALL EXECUTION
// =============================================================================

impl<S, I, R> EngineCore<S, I, R>
where
    S: KeyValueStore,
    I: IndexStore,
    R: RollupChannel,
{
    fn execute_advance(
        &mut self,
        route: &Registration,
        settings: ModuleSettings,
        metadata: BlockMetadata,
        payload: &[u8],
    ) -> Result<CallStatus, DispatchError> {
        self.begin()?;
        match self.invoke_advance(route, settings, metadata, payload) {
            Ok((CallStatus::Accept, pending_app_contract)) => {
                self.commit(pending_app_contract).map_err(|e| {
                    self.rollback();
                    e
                })?;
                self.persist()?;
                Ok(CallStatus::Accept)
            }
            Ok((CallStatus::Reject, _)) => {
                self.rollback();
                Ok(CallStatus::Reject)
            }
            Err(e) => {
                self.rollback();
                Err(e)
            }
        }
    }

    fn invoke_advance(
        &mut self,
        route: &Registration,
        settings: ModuleSettings,
        metadata: BlockMetadata,
        payload: &[u8],
    ) -> Result<(CallStatus, Option<Address>), DispatchError> {
        let (sender, decoded) = route.decode_input(metadata.msg_sender, payload)?;
        let mut guard =
            ContextGuard::activate(&mut self.ctx, route.key.clone(), settings, Some(metadata))?;
        guard.sender = Some(sender);
        guard.input_payload = decoded.clone();
        guard.input_class = route
            .descriptor
            .as_ref()
            .map_or("bytes", PayloadDescriptor::name)
            .to_string();
        debug!(route = %route.key, sender = %sender, "[rd-04] invoking mutation");

        let mut call = Call {
            ctx: &mut guard,
            store: &mut self.store,
            index: &mut self.index,
            rollup: &mut self.rollup,
            stats: &mut self.stats,
            app_contract: self.app_contract,
        };
        let status = route.invoke(&mut call, decoded)?;
        if status == CallStatus::Accept {
            call.index_input_if_outputs()?;
        }
        Ok((status, call.ctx.pending_app_contract))
    }

    /// Returns the handler result and whether a report was already sent.
    fn execute_inspect(
        &mut self,
        query: ResolvedQuery<'_>,
        settings: ModuleSettings,
    ) -> (Result<CallStatus, DispatchError>, bool) {
        if let Err(e) = self.begin() {
            return (Err(e), false);
        }
        let route = query.route;
        let result = ContextGuard::activate(&mut self.ctx, route.key.clone(), settings, None)
            .and_then(|mut guard| {
                guard.input_payload = query.payload.clone();
                guard.extended_params = query.extended;
                guard.splittable = route.config.splittable_output;
                guard.rpc_id = query.rpc_id;
                debug!(route = %route.key, "[rd-04] invoking query");

                let mut call = Call {
                    ctx: &mut guard,
                    store: &mut self.store,
                    index: &mut self.index,
                    rollup: &mut self.rollup,
                    stats: &mut self.stats,
                    app_contract: self.app_contract,
                };
                let status = route.invoke(&mut call, query.payload);
                Ok((status, call.ctx.n_reports > 0))
            });
        self.rollback();
        match result {
            Ok((status, reported)) => (status, reported),
            Err(e) => (Err(e), false),
        }
    }

    // =========================================================================
    // TRANSACTIONS
    // =========================================================================

    fn begin(&mut self) -> Result<(), DispatchError> {
        self.store.begin()?;
        if let Err(e) = self.index.begin() {
            let _ = self.store.rollback();
            return Err(e.into());
        }
        if let (Some(app), false) = (self.app_contract, self.backfilled) {
            match self.index.backfill_app_contract(app) {
                Ok(updated) => {
                    debug!(app_contract = %app, updated, "[rd-04] back-filling index entries");
                }
                Err(e) => {
                    self.rollback();
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    fn commit(&mut self, pending_app_contract: Option<Address>) -> Result<(), DispatchError> {
        if let Some(app) = pending_app_contract {
            self.index.backfill_app_contract(app)?;
        }
        self.store.commit()?;
        self.index.commit()?;
        if let Some(app) = pending_app_contract {
            info!(app_contract = %app, "[rd-04] application contract recorded");
            self.app_contract = Some(app);
        }
        if self.app_contract.is_some() {
            self.backfilled = true;
        }
        Ok(())
    }

    /// Flushes both stores. The commit is already visible, so a failure
    /// here is fatal.
    fn persist(&mut self) -> Result<(), DispatchError> {
        self.store.flush().map_err(DispatchError::Durability)?;
        self.index.flush().map_err(DispatchError::Durability)
    }

    fn halt(&mut self, e: &DispatchError) -> CallOutcome {
        error!(error = %e, "[rd-04] committed state is not durable, halting");
        self.halted = Some(e.to_string());
        self.stats.errors += 1;
        CallOutcome::Halted {
            message: e.to_string(),
        }
    }

    fn refuse_if_halted(&self) -> Option<CallOutcome> {
        self.halted.as_ref().map(|message| {
            warn!(cause = %message, "[rd-04] input refused: engine halted");
            CallOutcome::Halted {
                message: message.clone(),
            }
        })
    }

    fn rollback(&mut self) {
        if self.store.in_transaction() {
            if let Err(e) = self.store.rollback() {
                warn!(error = %e, "[rd-04] store rollback failed");
            }
        }
        if self.index.in_transaction() {
            if let Err(e) = self.index.rollback() {
                warn!(error = %e, "[rd-04] index rollback failed");
            }
        }
    }

    // =========================================================================
    // ERROR REPORTS
    // =========================================================================

    /// Best-effort diagnostic report, indexed with tag `error` for indexed
    /// modules during advance.
    fn emit_error_report(
        &mut self,
        module: &str,
        settings: &ModuleSettings,
        metadata: Option<&BlockMetadata>,
        mut body: Vec<u8>,
    ) {
        if settings.disabled {
            debug!(module, "[rd-04] error report dropped: module disabled");
            self.stats.dropped_outputs += 1;
            return;
        }
        body.truncate(MAX_OUTPUT_SIZE);
        if let Err(e) = self.rollup.emit_report(&body) {
            error!(module, error = %e, "[rd-04] could not send error report");
            return;
        }
        self.stats.reports += 1;

        if let (true, Some(meta)) = (settings.index_outputs, metadata) {
            match self.record_error(module, meta) {
                Ok(()) => {}
                Err(e) if e.is_fatal() => {
                    self.halt(&e);
                }
                Err(e) => warn!(module, error = %e, "[rd-04] could not index error report"),
            }
        }
    }

    fn record_error(&mut self, module: &str, metadata: &BlockMetadata) -> Result<(), DispatchError> {
        self.begin()?;
        let entry = IndexEntry::new(OutputKind::Report, module, "error", metadata)
            .with_tags(["error"])
            .with_app_contract(self.app_contract);
        if let Err(e) = self.index.append(entry) {
            self.rollback();
            return Err(e.into());
        }
        self.commit(None).map_err(|e| {
            self.rollback();
            e
        })?;
        self.persist()
    }
}
