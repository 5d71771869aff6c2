use std::{collections::BTreeMap, fmt};

use smol_str::SmolStr;

use super::writer::Segment;

/// Storage class of a declared identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Shared by every instance of the class.
    Static,
    /// Per instance variable.
    Field,
    Argument,
    Local,
}

impl Kind {
    const COUNT: usize = 4;

    /// VM segment the kind is stored in.
    pub fn segment(self) -> Segment {
        match self {
            Kind::Static => Segment::Static,
            Kind::Field => Segment::This,
            Kind::Argument => Segment::Argument,
            Kind::Local => Segment::Local,
        }
    }

    fn is_class_scope(self) -> bool {
        matches!(self, Kind::Static | Kind::Field)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Kind::Static => write!(f, "static"),
            Kind::Field => write!(f, "field"),
            Kind::Argument => write!(f, "argument"),
            Kind::Local => write!(f, "local"),
        }
    }
}

/// Declared type of a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarType {
    Int,
    Char,
    Boolean,
    Class(SmolStr),
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VarType::Int => write!(f, "int"),
            VarType::Char => write!(f, "char"),
            VarType::Boolean => write!(f, "boolean"),
            VarType::Class(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub ty: VarType,
    pub kind: Kind,
    pub index: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefineError {
    /// Name is already declared in the same scope.
    Redefinition,
    /// Every index of the kind is taken.
    Overflow,
}

/// Class and subroutine scoped symbols.
///
/// Names in the subroutine scope shadow names in the class scope.
#[derive(Debug, Default)]
pub struct SymbolTable {
    class_scope: BTreeMap<SmolStr, Entry>,
    subroutine_scope: BTreeMap<SmolStr, Entry>,
    /// Number of entries defined per kind, indexed by [`Kind::slot`].
    counts: [u16; Kind::COUNT],
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the arguments and locals of the previous subroutine.
    pub fn start_subroutine(&mut self) {
        self.subroutine_scope.clear();
        self.counts[Kind::Argument.slot()] = 0;
        self.counts[Kind::Local.slot()] = 0;
    }

    /// Add a symbol, returning its index among symbols of the same kind.
    ///
    /// A name may only appear once per scope, whatever its kind. At most
    /// `u16::MAX` symbols of one kind can be defined, so the count always
    /// fits in a VM instruction.
    pub fn define(&mut self, name: &str, ty: VarType, kind: Kind) -> Result<u16, DefineError> {
        let scope = if kind.is_class_scope() {
            &mut self.class_scope
        } else {
            &mut self.subroutine_scope
        };

        if scope.contains_key(name) {
            return Err(DefineError::Redefinition);
        }

        let index = self.counts[kind.slot()];
        self.counts[kind.slot()] = index.checked_add(1).ok_or(DefineError::Overflow)?;
        scope.insert(SmolStr::from(name), Entry { ty, kind, index });

        Ok(index)
    }

    /// Number of symbols of the given kind in its scope.
    #[inline]
    pub fn count(&self, kind: Kind) -> u16 {
        self.counts[kind.slot()]
    }

    #[inline]
    pub fn lookup(&self, name: &str) -> Option<&Entry> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    /// Kind of the symbol, or `None` when the name is undefined.
    #[inline]
    pub fn kind_of(&self, name: &str) -> Option<Kind> {
        self.lookup(name).map(|entry| entry.kind)
    }

    #[inline]
    pub fn type_of(&self, name: &str) -> Option<&VarType> {
        self.lookup(name).map(|entry| &entry.ty)
    }

    #[inline]
    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.lookup(name).map(|entry| entry.index)
    }
}
