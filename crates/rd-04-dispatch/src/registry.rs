//! # Route Registry
//!
//! Tables from wire identity to registration, filled once while the
//! application is wired and immutable afterwards.
//!
//! | Table | Key | Used by |
//! |-------|-----|---------|
//! | `by_key` | `module.method` | uniqueness, URL queries |
//! | `by_selector` | 4-byte header | advance inputs with a header |
//! | `by_sender` | caller address | header-less advance inputs |
//! | `by_method` | `module_method` | JSON and JSON-RPC queries |
//!
//! Every wiring mistake is a [`ConfigurationError`] raised by
//! [`Registry::register`], before any input is processed.

use crate::call::Call;
use crate::domain::{CallStatus, RouteConfig, RouteIdentity, RouteInfo, RouteKey, RouteKind};
use crate::errors::{ConfigurationError, DispatchError};
use rd_01_abi_codec::prelude::{
    selector, signature, AbiType, FieldDescriptor, Payload, PayloadDescriptor, Selector,
};
use rd_02_query_codec::prelude::{method_name, url_template};
use shared_types::Address;
use std::collections::{BTreeSet, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::info;

/// Name of the optional field added to splittable query descriptors.
pub const PART_FIELD: &str = "part";

/// Handler body: the call handle plus the decoded payload, if the route
/// declares one.
pub type Handler =
    Box<dyn Fn(&mut Call<'_>, Option<Payload>) -> Result<CallStatus, DispatchError>>;

// =============================================================================
// REGISTRATION
// =============================================================================

/// One registered route.
pub struct Registration {
    /// Final route key (module override applied).
    pub key: RouteKey,
    /// Mutation or query.
    pub kind: RouteKind,
    /// Payload layout; `None` for handlers without a payload.
    pub descriptor: Option<PayloadDescriptor>,
    /// Query layout with the trailing `part` field, for splittable routes.
    pub extended: Option<PayloadDescriptor>,
    /// Registration flags.
    pub config: RouteConfig,
    /// Header of mutations that carry one.
    pub selector: Option<Selector>,
    handler: Handler,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("descriptor", &self.descriptor)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Registration {
    /// Runs the handler. A panic is turned into a handler error.
    pub(crate) fn invoke(
        &self,
        call: &mut Call<'_>,
        payload: Option<Payload>,
    ) -> Result<CallStatus, DispatchError> {
        match catch_unwind(AssertUnwindSafe(|| (self.handler)(call, payload))) {
            Ok(result) => result,
            Err(panic) => {
                let msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "handler panicked".to_string());
                Err(DispatchError::Handler(msg))
            }
        }
    }

    /// Splits an advance input into the effective caller and the decoded
    /// payload: header (if any), proxy address (if enabled), then the tuple.
    /// Bytes past the decoded tuple are ignored.
    pub fn decode_input(
        &self,
        msg_sender: Address,
        input: &[u8],
    ) -> Result<(Address, Option<Payload>), DispatchError> {
        let mut body = if self.selector.is_some() {
            input.get(4..).unwrap_or_default()
        } else {
            input
        };
        let mut sender = msg_sender;
        if self.config.proxy {
            let raw = body.get(..Address::LEN).ok_or_else(|| {
                DispatchError::Decode(format!(
                    "proxy input shorter than {} bytes",
                    Address::LEN
                ))
            })?;
            sender = Address::from_slice(raw)
                .ok_or_else(|| DispatchError::Decode("invalid proxy address".into()))?;
            body = &body[Address::LEN..];
        }
        let payload = match &self.descriptor {
            None => None,
            Some(d) if self.config.packed => Some(d.decode_packed(body)?),
            Some(d) => Some(d.decode(body)?),
        };
        Ok((sender, payload))
    }

    /// Builds the advance input [`decode_input`](Self::decode_input)
    /// accepts. `proxy` is written only for proxy routes.
    pub fn encode_input(
        &self,
        proxy: Option<Address>,
        payload: &Payload,
    ) -> Result<Vec<u8>, DispatchError> {
        let mut data = self.selector.map(|s| s.to_vec()).unwrap_or_default();
        if self.config.proxy {
            let address = proxy.ok_or_else(|| {
                DispatchError::handler(format!("{} expects a proxy address", self.key))
            })?;
            data.extend_from_slice(address.as_bytes());
        }
        match &self.descriptor {
            None => {}
            Some(d) if self.config.packed => data.extend(d.encode_packed(payload)?),
            Some(d) => data.extend(d.encode(payload)?),
        }
        Ok(data)
    }

    /// Wire identity of this route.
    #[must_use]
    pub fn identity(&self) -> RouteIdentity {
        match (self.kind, self.selector, self.config.msg_sender) {
            (RouteKind::Mutation, Some(sel), _) => RouteIdentity::Selector(sel),
            (RouteKind::Mutation, None, sender) => {
                RouteIdentity::Caller(sender.unwrap_or(Address::ZERO))
            }
            (RouteKind::Query, _, _) => RouteIdentity::Query {
                url: url_template(&self.key.module, &self.key.method, &self.config.path_params),
                method: method_name(&self.key.module, &self.key.method),
            },
        }
    }

    /// Introspection record.
    #[must_use]
    pub fn info(&self) -> RouteInfo {
        RouteInfo {
            key: self.key.clone(),
            kind: self.kind,
            identity: self.identity(),
            descriptor: self.descriptor.clone(),
            config: self.config.clone(),
        }
    }
}

/// Signature hashed into a mutation header: `module.method(types)`.
#[must_use]
pub fn mutation_signature(key: &RouteKey, descriptor: Option<&PayloadDescriptor>) -> String {
    let types = descriptor.map(PayloadDescriptor::abi_types).unwrap_or_default();
    signature(&key.to_string(), &types)
}

// =============================================================================
// REGISTRY
// =============================================================================

/// All registered routes.
#[derive(Debug, Default)]
pub struct Registry {
    routes: Vec<Registration>,
    by_key: HashMap<RouteKey, usize>,
    by_selector: HashMap<Selector, usize>,
    by_sender: HashMap<Address, usize>,
    by_method: HashMap<String, usize>,
}

impl Registry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route. `module` is replaced by `config.module_name` when set.
    pub fn register(
        &mut self,
        kind: RouteKind,
        module: &str,
        method: &str,
        descriptor: Option<PayloadDescriptor>,
        config: RouteConfig,
        handler: Handler,
    ) -> Result<(), ConfigurationError> {
        let module = config.module_name.clone().unwrap_or_else(|| module.to_string());
        let key = RouteKey::new(module, method);
        let route = key.to_string();

        if self.by_key.contains_key(&key) {
            return Err(ConfigurationError::DuplicateRoute(route));
        }
        if let Some(d) = &descriptor {
            d.validate()
                .map_err(|source| ConfigurationError::InvalidDescriptor {
                    route: route.clone(),
                    source,
                })?;
        }

        let mut selector_value = None;
        let mut extended = None;
        match kind {
            RouteKind::Mutation => {
                if config.splittable_output {
                    return Err(ConfigurationError::SplittableMutation(route));
                }
                if config.proxy && config.msg_sender.is_some() {
                    return Err(ConfigurationError::ConflictingCallerConfig(route));
                }
                if config.packed && !descriptor.as_ref().is_some_and(PayloadDescriptor::is_packable)
                {
                    return Err(ConfigurationError::NotPackable(route));
                }
                if config.no_header {
                    let sender = config
                        .msg_sender
                        .ok_or_else(|| ConfigurationError::HeaderlessWithoutSender(route.clone()))?;
                    if self.by_sender.contains_key(&sender) {
                        return Err(ConfigurationError::DuplicateSender(sender));
                    }
                } else {
                    let sel = selector(&mutation_signature(&key, descriptor.as_ref()));
                    if let Some(&first) = self.by_selector.get(&sel) {
                        return Err(ConfigurationError::DuplicateSelector {
                            selector: hex::encode(sel),
                            first: self.routes[first].key.to_string(),
                            second: route,
                        });
                    }
                    selector_value = Some(sel);
                }
            }
            RouteKind::Query => {
                for param in &config.path_params {
                    let known = descriptor
                        .as_ref()
                        .is_some_and(|d| d.get_field(param).is_some());
                    if !known {
                        return Err(ConfigurationError::UnknownPathParam {
                            route,
                            param: param.clone(),
                        });
                    }
                }
                let name = method_name(&key.module, &key.method);
                if self.by_method.contains_key(&name) {
                    return Err(ConfigurationError::DuplicateMethod(name));
                }
                if config.splittable_output {
                    let base = descriptor.clone().unwrap_or_else(PayloadDescriptor::empty);
                    extended = Some(base.extended(
                        format!("{}Extended", base.name()),
                        vec![FieldDescriptor::optional(PART_FIELD, AbiType::UINT256)],
                    ));
                }
            }
        }

        let idx = self.routes.len();
        match (kind, selector_value) {
            (RouteKind::Mutation, Some(sel)) => {
                info!(route = %key, selector = %format!("0x{}", hex::encode(sel)), "[rd-04] registered mutation");
                self.by_selector.insert(sel, idx);
            }
            (RouteKind::Mutation, None) => {
                if let Some(sender) = config.msg_sender {
                    info!(route = %key, caller = %sender, "[rd-04] registered header-less mutation");
                    self.by_sender.insert(sender, idx);
                }
            }
            (RouteKind::Query, _) => {
                let name = method_name(&key.module, &key.method);
                info!(
                    route = %key,
                    path = %url_template(&key.module, &key.method, &config.path_params),
                    method = %name,
                    "[rd-04] registered query"
                );
                self.by_method.insert(name, idx);
            }
        }
        self.by_key.insert(key.clone(), idx);
        self.routes.push(Registration {
            key,
            kind,
            descriptor,
            extended,
            config,
            selector: selector_value,
            handler,
        });
        Ok(())
    }

    /// Route by key.
    #[must_use]
    pub fn get(&self, key: &RouteKey) -> Option<&Registration> {
        self.by_key.get(key).map(|&i| &self.routes[i])
    }

    /// Mutation by 4-byte header.
    #[must_use]
    pub fn by_selector(&self, selector: &[u8]) -> Option<&Registration> {
        let sel: Selector = selector.try_into().ok()?;
        self.by_selector.get(&sel).map(|&i| &self.routes[i])
    }

    /// Header-less mutation selected by `sender`.
    #[must_use]
    pub fn by_sender(&self, sender: &Address) -> Option<&Registration> {
        self.by_sender.get(sender).map(|&i| &self.routes[i])
    }

    /// Query by structured method name.
    #[must_use]
    pub fn by_method(&self, name: &str) -> Option<&Registration> {
        self.by_method.get(name).map(|&i| &self.routes[i])
    }

    /// Every registration of `kind`, in registration order.
    pub fn resolve_all(&self, kind: RouteKind) -> impl Iterator<Item = &Registration> {
        self.routes.iter().filter(move |r| r.kind == kind)
    }

    /// Every registration, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.routes.iter()
    }

    /// Names of modules with at least one route.
    #[must_use]
    pub fn modules(&self) -> BTreeSet<&str> {
        self.routes.iter().map(|r| r.key.module.as_str()).collect()
    }

    /// Number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
