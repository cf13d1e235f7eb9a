//! Structural declarations on a product.
//!
//! Declarations are recorded as flags and collapsed once into a closed
//! `Structure`, which is all the kernels look at.

use bitflags::bitflags;

use crate::core::traits::Band;

bitflags! {
    /// Declarations attached to a product.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DeclFlags: u8 {
        const SYMMETRIC = 0b0001;
        const HERMITIAN = 0b0010;
        const LOWER     = 0b0100;
        const UPPER     = 0b1000;
        const DIAGONAL  = Self::LOWER.bits() | Self::UPPER.bits();
    }
}

impl DeclFlags {
    /// Declared lower, or declared symmetric/Hermitian and upper.
    pub fn low(self) -> bool {
        self.contains(Self::LOWER)
            || (self.intersects(Self::SYMMETRIC | Self::HERMITIAN) && self.contains(Self::UPPER))
    }

    /// Declared upper, or declared symmetric/Hermitian and lower.
    pub fn upp(self) -> bool {
        self.contains(Self::UPPER)
            || (self.intersects(Self::SYMMETRIC | Self::HERMITIAN) && self.contains(Self::LOWER))
    }

    pub fn herm(self) -> bool {
        self.contains(Self::HERMITIAN) && !self.intersects(Self::LOWER | Self::UPPER)
    }

    pub fn sym(self) -> bool {
        self.contains(Self::SYMMETRIC)
            && !self.intersects(Self::HERMITIAN | Self::LOWER | Self::UPPER)
    }
}

/// Effective structure of a product result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Structure {
    #[default]
    General,
    Symmetric,
    Hermitian,
    Lower,
    Upper,
    Diagonal,
}

impl Structure {
    pub fn from_flags(flags: DeclFlags) -> Self {
        match (flags.low(), flags.upp()) {
            (true, true) => Structure::Diagonal,
            (true, false) => Structure::Lower,
            (false, true) => Structure::Upper,
            _ if flags.herm() => Structure::Hermitian,
            _ if flags.sym() => Structure::Symmetric,
            _ => Structure::General,
        }
    }

    /// The upper triangle is filled by mirroring the lower one.
    pub fn mirrors(self) -> bool {
        matches!(self, Structure::Symmetric | Structure::Hermitian)
    }

    pub fn is_structured(self) -> bool {
        self != Structure::General
    }

    /// Band implied by the declaration when the product is itself an operand.
    pub fn band(self) -> Band {
        match self {
            Structure::Lower => Band::Lower,
            Structure::Upper => Band::Upper,
            Structure::Diagonal => Band::Diagonal,
            _ => Band::General,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Structure::General => "general",
            Structure::Symmetric => "symmetric",
            Structure::Hermitian => "Hermitian",
            Structure::Lower => "lower",
            Structure::Upper => "upper",
            Structure::Diagonal => "diagonal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_declarations() {
        assert_eq!(Structure::from_flags(DeclFlags::empty()), Structure::General);
        assert_eq!(Structure::from_flags(DeclFlags::SYMMETRIC), Structure::Symmetric);
        assert_eq!(Structure::from_flags(DeclFlags::HERMITIAN), Structure::Hermitian);
        assert_eq!(Structure::from_flags(DeclFlags::LOWER), Structure::Lower);
        assert_eq!(Structure::from_flags(DeclFlags::UPPER), Structure::Upper);
        assert_eq!(Structure::from_flags(DeclFlags::DIAGONAL), Structure::Diagonal);
    }

    #[test]
    fn symmetric_and_triangular_is_diagonal() {
        let f = DeclFlags::SYMMETRIC | DeclFlags::LOWER;
        assert!(f.low() && f.upp() && !f.sym());
        assert_eq!(Structure::from_flags(f), Structure::Diagonal);
        let g = DeclFlags::HERMITIAN | DeclFlags::UPPER;
        assert_eq!(Structure::from_flags(g), Structure::Diagonal);
    }

    #[test]
    fn hermitian_wins_over_symmetric() {
        let f = DeclFlags::SYMMETRIC | DeclFlags::HERMITIAN;
        assert!(f.herm() && !f.sym());
        assert_eq!(Structure::from_flags(f), Structure::Hermitian);
        assert!(Structure::Hermitian.mirrors());
        assert!(!Structure::Lower.mirrors());
    }
}
