//! Correspondence between engine type tags and static tag identifiers.
//!
//! Static identifiers follow the declaration order of the static variant:
//! scalars `0..=14` in `Kind` order, vectors `15..=29`, then mixed list
//! `30`, table `31`, dictionary `32`. `Unit` is a constant constructor and is
//! numbered on its own, as constant `0`.

use qbridge_kobj::{Kind, TypeTag};

use crate::error::BridgeError;

const VECTOR_BASE: u8 = 15;
const MIXED_LIST_ID: u8 = 30;
const TABLE_ID: u8 = 31;
const DICT_ID: u8 = 32;

/// Tag identifier of a `StaticValue` case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaticTag {
    Scalar(Kind),
    Vector(Kind),
    MixedList,
    Table,
    Dict,
    Unit,
}

impl StaticTag {
    /// Numeric identifier. Use together with `is_constant`, since `Unit`
    /// shares the number `0` with the bool scalar.
    pub fn id(self) -> u8 {
        match self {
            StaticTag::Scalar(kind) => kind as u8,
            StaticTag::Vector(kind) => VECTOR_BASE + kind as u8,
            StaticTag::MixedList => MIXED_LIST_ID,
            StaticTag::Table => TABLE_ID,
            StaticTag::Dict => DICT_ID,
            StaticTag::Unit => 0,
        }
    }

    pub fn is_constant(self) -> bool {
        matches!(self, StaticTag::Unit)
    }

    pub fn from_id(id: u8, constant: bool) -> Option<StaticTag> {
        if constant {
            return (id == 0).then_some(StaticTag::Unit);
        }
        match id {
            MIXED_LIST_ID => Some(StaticTag::MixedList),
            TABLE_ID => Some(StaticTag::Table),
            DICT_ID => Some(StaticTag::Dict),
            id if id < VECTOR_BASE => Kind::ALL.get(id as usize).copied().map(StaticTag::Scalar),
            id => Kind::ALL
                .get((id - VECTOR_BASE) as usize)
                .copied()
                .map(StaticTag::Vector),
        }
    }
}

/// Static tag for a supported engine tag.
///
/// Function-like tags fail with `UnsupportedValueKind`. The error tag is a
/// receive-only signal, never data, and fails the same way.
pub fn static_tag(tag: TypeTag) -> Result<StaticTag, BridgeError> {
    match tag {
        TypeTag::Atom(kind) => Ok(StaticTag::Scalar(kind)),
        TypeTag::Vector(kind) => Ok(StaticTag::Vector(kind)),
        TypeTag::MixedList => Ok(StaticTag::MixedList),
        TypeTag::Table => Ok(StaticTag::Table),
        TypeTag::Dict => Ok(StaticTag::Dict),
        TypeTag::Unit => Ok(StaticTag::Unit),
        TypeTag::Lambda | TypeTag::Operator | TypeTag::Projection | TypeTag::Error => {
            Err(BridgeError::UnsupportedValueKind(format!("not supported: {tag}")))
        }
    }
}

/// Static tag for a raw engine code. Unknown codes fail with `InvalidTag`.
pub fn static_tag_for_code(code: i8) -> Result<StaticTag, BridgeError> {
    let tag = TypeTag::from_code(code)
        .ok_or(BridgeError::InvalidTag { code, context: "type code lookup" })?;
    static_tag(tag)
}

/// Inverse mapping: the engine tag a static case is encoded as.
pub fn type_tag(tag: StaticTag) -> TypeTag {
    match tag {
        StaticTag::Scalar(kind) => TypeTag::Atom(kind),
        StaticTag::Vector(kind) => TypeTag::Vector(kind),
        StaticTag::MixedList => TypeTag::MixedList,
        StaticTag::Table => TypeTag::Table,
        StaticTag::Dict => TypeTag::Dict,
        StaticTag::Unit => TypeTag::Unit,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn supported() -> Vec<TypeTag> {
        let mut tags: Vec<TypeTag> = Kind::ALL
            .iter()
            .flat_map(|&k| [TypeTag::Atom(k), TypeTag::Vector(k)])
            .collect();
        tags.extend([TypeTag::MixedList, TypeTag::Table, TypeTag::Dict, TypeTag::Unit]);
        tags
    }

    #[test]
    fn mapping_is_total_and_injective_over_supported_tags() {
        let mut seen = HashSet::new();
        for tag in supported() {
            let st = static_tag(tag).unwrap();
            assert!(seen.insert((st.id(), st.is_constant())), "duplicate id for {tag}");
            assert_eq!(type_tag(st), tag);
        }
        assert_eq!(seen.len(), 34);
    }

    #[test]
    fn identifiers_follow_declaration_order() {
        assert_eq!(StaticTag::Scalar(Kind::Bool).id(), 0);
        assert_eq!(StaticTag::Scalar(Kind::Time).id(), 14);
        assert_eq!(StaticTag::Vector(Kind::Bool).id(), 15);
        assert_eq!(StaticTag::Vector(Kind::Symbol).id(), 23);
        assert_eq!(StaticTag::Vector(Kind::Time).id(), 29);
        assert_eq!(StaticTag::MixedList.id(), 30);
        assert_eq!(StaticTag::Dict.id(), 32);
        assert_eq!(StaticTag::from_id(23, false), Some(StaticTag::Vector(Kind::Symbol)));
        assert_eq!(StaticTag::from_id(0, true), Some(StaticTag::Unit));
        assert_eq!(StaticTag::from_id(33, false), None);
    }

    #[test]
    fn function_tags_are_unsupported() {
        for tag in [TypeTag::Lambda, TypeTag::Operator, TypeTag::Projection] {
            assert!(matches!(static_tag(tag), Err(BridgeError::UnsupportedValueKind(_))));
        }
        let err = static_tag_for_code(104).unwrap_err();
        assert!(err.to_string().contains("partial application"));
    }

    #[test]
    fn unknown_codes_are_invalid() {
        assert!(matches!(
            static_tag_for_code(-12),
            Err(BridgeError::InvalidTag { code: -12, .. })
        ));
        assert!(matches!(static_tag_for_code(77), Err(BridgeError::InvalidTag { code: 77, .. })));
    }
}
