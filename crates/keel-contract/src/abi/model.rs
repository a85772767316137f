//! Contract-interface descriptors and overload resolution
//!
//! An [`AbiModel`] holds the parsed interface of one contract: every
//! callable item keyed by name, with overloads kept in insertion order.
//! The model is immutable once built and shared read-only by every proxy
//! bound to the contract.

use std::collections::HashMap;
use std::sync::Arc;

use super::encode::{function_selector, parse_type};
use super::types::ParamType;
use crate::ContractError;

/// What kind of ABI item a descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiItemKind {
    /// Callable contract function
    Function,
    /// Deployment constructor
    Constructor,
    /// Emitted event (not callable)
    Event,
    /// Fallback function
    Fallback,
}

/// Declared state mutability of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateMutability {
    /// Reads nothing, writes nothing
    Pure,
    /// Reads state, writes nothing
    View,
    /// Mutates state, rejects attached value
    NonPayable,
    /// Mutates state, accepts attached value
    Payable,
}

/// How an invocation of a descriptor is routed by default.
///
/// `Estimate` is never derived from a descriptor; it is selected per call
/// site. A `Deploy` descriptor invoked with constructor arguments is
/// dispatched as `Send` while encoding keeps deployment semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Read-only call, no transaction
    Call,
    /// State-mutating transaction
    Send,
    /// Gas estimation for a would-be transaction
    Estimate,
    /// Contract deployment
    Deploy,
    /// Message signing, bypasses RPC dispatch entirely
    Sign,
}

impl RequestKind {
    /// The kind used for dispatch; deployments submit as transactions.
    pub fn for_dispatch(&self) -> RequestKind {
        match self {
            RequestKind::Deploy => RequestKind::Send,
            other => *other,
        }
    }
}

/// A named, typed parameter of an ABI item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name (may be empty)
    pub name: String,
    /// Declared type
    pub kind: ParamType,
}

impl Param {
    /// Create a named parameter
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a named parameter from a textual ABI type, e.g.
    /// `Param::parse("amount", "uint256")`.
    pub fn parse(name: impl Into<String>, kind: &str) -> Result<Self, ContractError> {
        Ok(Self {
            name: name.into(),
            kind: parse_type(kind)?,
        })
    }
}

/// Immutable descriptor of one ABI item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiItemDescriptor {
    /// Item name ("" for constructor/fallback)
    pub name: String,
    /// Item kind
    pub kind: AbiItemKind,
    /// Ordered input parameters
    pub inputs: Vec<Param>,
    /// Ordered output parameters
    pub outputs: Vec<Param>,
    /// Declared mutability
    pub state_mutability: StateMutability,
    request_kind: RequestKind,
}

impl AbiItemDescriptor {
    /// Create a function descriptor; the request kind is derived from
    /// the declared mutability (view/pure call, payable/nonpayable send).
    pub fn function(
        name: impl Into<String>,
        state_mutability: StateMutability,
        inputs: Vec<Param>,
        outputs: Vec<Param>,
    ) -> Self {
        let request_kind = match state_mutability {
            StateMutability::Pure | StateMutability::View => RequestKind::Call,
            StateMutability::NonPayable | StateMutability::Payable => RequestKind::Send,
        };
        Self {
            name: name.into(),
            kind: AbiItemKind::Function,
            inputs,
            outputs,
            state_mutability,
            request_kind,
        }
    }

    /// Create a constructor descriptor.
    pub fn constructor(inputs: Vec<Param>) -> Self {
        Self {
            name: String::new(),
            kind: AbiItemKind::Constructor,
            inputs,
            outputs: Vec::new(),
            state_mutability: StateMutability::NonPayable,
            request_kind: RequestKind::Deploy,
        }
    }

    /// The routing kind derived at construction; never changes afterwards.
    pub fn request_kind(&self) -> RequestKind {
        self.request_kind
    }

    /// Canonical signature, e.g. `transfer(address,uint256)`.
    pub fn signature(&self) -> String {
        let inputs: Vec<String> = self.inputs.iter().map(|p| p.kind.canonical()).collect();
        format!("{}({})", self.name, inputs.join(","))
    }

    /// 4-byte selector of the canonical signature.
    pub fn selector(&self) -> [u8; 4] {
        function_selector(&self.signature())
    }

    /// Input types in declaration order.
    pub fn input_types(&self) -> Vec<ParamType> {
        self.inputs.iter().map(|p| p.kind.clone()).collect()
    }

    /// Output types in declaration order.
    pub fn output_types(&self) -> Vec<ParamType> {
        self.outputs.iter().map(|p| p.kind.clone()).collect()
    }
}

/// Result of looking a method up by name and argument count.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Exactly one descriptor matched
    Single(Arc<AbiItemDescriptor>),
    /// Several descriptors share the arity; the caller must disambiguate
    Ambiguous(Vec<Arc<AbiItemDescriptor>>),
}

/// Read-only lookup table from method name to overload set.
#[derive(Debug, Default)]
pub struct AbiModel {
    functions: HashMap<String, Vec<Arc<AbiItemDescriptor>>>,
    constructor: Option<Arc<AbiItemDescriptor>>,
}

impl AbiModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from descriptors.
    pub fn from_items(items: impl IntoIterator<Item = AbiItemDescriptor>) -> Self {
        let mut model = Self::new();
        for item in items {
            model.insert(item);
        }
        model
    }

    /// Add a descriptor. Functions accumulate as overload sets; a
    /// constructor replaces any previous one. Events and fallbacks are
    /// not callable and are ignored.
    pub fn insert(&mut self, item: AbiItemDescriptor) {
        match item.kind {
            AbiItemKind::Function => {
                self.functions
                    .entry(item.name.clone())
                    .or_default()
                    .push(Arc::new(item));
            }
            AbiItemKind::Constructor => {
                self.constructor = Some(Arc::new(item));
            }
            AbiItemKind::Event | AbiItemKind::Fallback => {}
        }
    }

    /// The constructor descriptor, if the contract declares one.
    pub fn constructor(&self) -> Option<&Arc<AbiItemDescriptor>> {
        self.constructor.as_ref()
    }

    /// Resolve a method name, optionally filtered by argument count.
    ///
    /// With an argument count: exactly one surviving overload resolves to
    /// it, none is an [`ContractError::ArityMismatch`], several are
    /// returned as [`Resolution::Ambiguous`] for the caller to reject or
    /// disambiguate by value inspection. Arbitrary picks never happen.
    pub fn resolve(
        &self,
        name: &str,
        argument_count: Option<usize>,
    ) -> Result<Resolution, ContractError> {
        let candidates = self
            .functions
            .get(name)
            .ok_or_else(|| ContractError::MethodNotFound(name.to_string()))?;

        let Some(count) = argument_count else {
            return Ok(if candidates.len() == 1 {
                Resolution::Single(candidates[0].clone())
            } else {
                Resolution::Ambiguous(candidates.clone())
            });
        };

        let mut matching: Vec<Arc<AbiItemDescriptor>> = candidates
            .iter()
            .filter(|c| c.inputs.len() == count)
            .cloned()
            .collect();

        match matching.len() {
            0 => Err(ContractError::ArityMismatch {
                name: name.to_string(),
                expected: candidates.iter().map(|c| c.inputs.len()).collect(),
                got: count,
            }),
            1 => Ok(Resolution::Single(matching.remove(0))),
            _ => Ok(Resolution::Ambiguous(matching)),
        }
    }

    /// Names of all callable functions.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(|s| s.as_str())
    }
}
