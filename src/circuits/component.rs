use crate::math::Scalar;
use crate::units::{Capacitance, Resistance};

/// Discriminant of a [`Component`], used by edge records and filters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Two-terminal resistor.
    Resistor,
    /// Two-terminal capacitor.
    Capacitor,
}

/// Payload carried by every branch of a circuit graph.
///
/// The set of kinds is closed; code that needs kind-specific behavior
/// matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Component {
    /// Lumped resistor.
    Resistor(Resistance),
    /// Lumped capacitor.
    Capacitor(Capacitance),
}

impl Component {
    /// Creates a resistor of `ohms`.
    #[must_use]
    pub const fn resistor(ohms: Scalar) -> Self {
        Self::Resistor(Resistance::new(ohms))
    }

    /// Creates a capacitor of `farads`.
    #[must_use]
    pub const fn capacitor(farads: Scalar) -> Self {
        Self::Capacitor(Capacitance::new(farads))
    }

    /// Builds a component from its kind tag and raw SI value.
    #[must_use]
    pub const fn from_kind(kind: ComponentKind, value: Scalar) -> Self {
        match kind {
            ComponentKind::Resistor => Self::resistor(value),
            ComponentKind::Capacitor => Self::capacitor(value),
        }
    }

    /// Kind tag.
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::Resistor(_) => ComponentKind::Resistor,
            Self::Capacitor(_) => ComponentKind::Capacitor,
        }
    }

    /// Raw SI value (ohms or farads).
    #[must_use]
    pub const fn value(&self) -> Scalar {
        match self {
            Self::Resistor(r) => r.value(),
            Self::Capacitor(c) => c.value(),
        }
    }

    /// True for resistors.
    #[must_use]
    pub const fn is_resistor(&self) -> bool {
        matches!(self, Self::Resistor(_))
    }
}
