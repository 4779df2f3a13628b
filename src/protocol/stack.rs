use std::collections::BTreeSet;
use std::fmt;

/// Identifier of the catchup application protocol.
pub const CATCHUP_PROTOCOL: &str = "catchup";

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ApplicationProtocol {
    pub identifier: String,
    pub version: u32,
}

/// A negotiated transformation of the byte stream below the application protocol, such as
/// compression. `category` names what it does and `implementation` which variant was chosen.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ModifierProtocol {
    pub category: String,
    pub implementation: String,
}

/// ProtocolStack is the outcome of a handshake: the application protocol version both sides
/// speak, plus the modifiers they agreed on.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ProtocolStack {
    pub application: ApplicationProtocol,
    pub modifiers: Vec<ModifierProtocol>,
}

impl fmt::Display for ProtocolStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.application.identifier, self.application.version)?;
        for modifier in &self.modifiers {
            write!(f, " +{}:{}", modifier.category, modifier.implementation)?;
        }
        Ok(())
    }
}

/// ProtocolSelection is one side's offer for a protocol: its identifier and every version of it
/// that side is willing to speak.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ProtocolSelection<U: Ord> {
    identifier: String,
    versions: BTreeSet<U>,
}

impl<U: Ord + Clone> ProtocolSelection<U> {
    pub fn new(identifier: impl Into<String>, versions: impl IntoIterator<Item = U>) -> Self {
        ProtocolSelection {
            identifier: identifier.into(),
            versions: versions.into_iter().collect(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn versions(&self) -> &BTreeSet<U> {
        &self.versions
    }

    /// The highest version present both here and in `offered`.
    pub fn highest_common<'a>(&self, offered: impl IntoIterator<Item = &'a U>) -> Option<U>
    where
        U: 'a,
    {
        offered
            .into_iter()
            .filter(|version| self.versions.contains(version))
            .max()
            .cloned()
    }
}

/// Everything one member is able to speak: one application protocol and any number of modifier
/// categories.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SupportedProtocols {
    pub application: ProtocolSelection<u32>,
    pub modifiers: Vec<ProtocolSelection<String>>,
}

impl SupportedProtocols {
    pub fn new(application: ProtocolSelection<u32>, modifiers: Vec<ProtocolSelection<String>>) -> Self {
        SupportedProtocols { application, modifiers }
    }

    /// Catchup version 1 with no modifiers.
    pub fn catchup() -> Self {
        SupportedProtocols::new(ProtocolSelection::new(CATCHUP_PROTOCOL, vec![1]), vec![])
    }

    pub(crate) fn modifier(&self, category: &str) -> Option<&ProtocolSelection<String>> {
        self.modifiers.iter().find(|m| m.identifier() == category)
    }
}
