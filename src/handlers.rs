//! Stock handlers a [`Spec`] can name instead of a module-supplied one
//! (spec §4.3). Each validates "single value, no attributes, no children"
//! unless noted otherwise, and writes into the typed `Dest` variant it
//! expects — a mismatch between a stock handler and the wrong `Dest`
//! variant is a module bug, not a parse error, so it's silently ignored
//! rather than panicking (the handler just doesn't write anywhere).

use crate::dispatcher::{dispatch_block, DispatchCtx};
use crate::entry::Entry;
use crate::error::CfgError;
use crate::spec::{Dest, Spec, SpecExt};

fn single_value<'e>(spec: &Spec, entry: &'e Entry) -> Result<&'e str, CfgError> {
    if !entry.attributes.is_empty() || entry.has_children || entry.values.len() != 1 {
        return Err(CfgError::BadValue {
            name: spec.name.clone(),
            value: entry.values.join(" "),
            reason: "expected exactly one value, no attributes, no children".to_string(),
        });
    }
    Ok(&entry.values[0])
}

/// Accepts `1 y on yes true enable` as true and `0 n off no false disable`
/// as false, case-insensitively; anything else is [`CfgError::BadValue`].
pub fn bool_handler(spec: &Spec, entry: &Entry, _ctx: &mut DispatchCtx) -> Result<(), CfgError> {
    let value = single_value(spec, entry)?;
    let lower = value.to_ascii_lowercase();
    let parsed = match lower.as_str() {
        "1" | "y" | "on" | "yes" | "true" | "enable" => true,
        "0" | "n" | "off" | "no" | "false" | "disable" => false,
        _ => {
            return Err(CfgError::BadValue {
                name: spec.name.clone(),
                value: value.to_string(),
                reason: "not a recognized boolean keyword".to_string(),
            })
        }
    };
    if let Dest::Bool(cell) = &spec.dest {
        cell.set(parsed);
    }
    Ok(())
}

/// Strips a `0x`/`0b` prefix (case-insensitive) to select base 16/2,
/// otherwise parses base 10 without treating a leading zero as octal.
/// Honors an optional `[min, max]` range (when `min != max`) and an
/// optional "multiple of N" constraint from [`SpecExt::IntConstraint`].
pub fn int_handler(spec: &Spec, entry: &Entry, _ctx: &mut DispatchCtx) -> Result<(), CfgError> {
    let value = single_value(spec, entry)?;
    let parsed = parse_int(value).ok_or_else(|| CfgError::BadValue {
        name: spec.name.clone(),
        value: value.to_string(),
        reason: "not a valid integer".to_string(),
    })?;

    if let SpecExt::IntConstraint {
        range,
        multiple_of,
    } = &spec.spec_ext
    {
        if let Some((min, max)) = range {
            if min != max && (parsed < *min || parsed > *max) {
                return Err(CfgError::ValueOutOfRange {
                    name: spec.name.clone(),
                    value: value.to_string(),
                    min: *min as i64,
                    max: *max as i64,
                });
            }
        }
        if let Some(n) = multiple_of {
            if *n != 0 && parsed % n != 0 {
                return Err(CfgError::BadValue {
                    name: spec.name.clone(),
                    value: value.to_string(),
                    reason: format!("not a multiple of {n}"),
                });
            }
        }
    }

    if let Dest::Int(cell) = &spec.dest {
        cell.set(parsed);
    }
    Ok(())
}

fn parse_int(s: &str) -> Option<i32> {
    let (negative, rest) = match s.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (radix, digits) = if let Some(h) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        (16, h)
    } else if let Some(b) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        (2, b)
    } else {
        (10, rest)
    };
    if digits.is_empty() {
        return None;
    }
    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    let signed = if negative { -magnitude } else { magnitude };
    i32::try_from(signed).ok()
}

/// Copies the value into a caller-provided buffer, rejecting strings that
/// overflow it or fall outside an optional [`SpecExt::StringConstraint`]
/// length range.
pub fn string_handler(spec: &Spec, entry: &Entry, _ctx: &mut DispatchCtx) -> Result<(), CfgError> {
    let value = single_value(spec, entry)?;
    let Dest::StringBuf(buf, max_len) = &spec.dest else {
        return Ok(());
    };
    if value.len() > *max_len {
        return Err(CfgError::BadValue {
            name: spec.name.clone(),
            value: value.to_string(),
            reason: format!("exceeds buffer length {max_len}"),
        });
    }
    if let SpecExt::StringConstraint {
        len_range: Some((min, max)),
    } = &spec.spec_ext
    {
        if value.len() < *min || value.len() > *max {
            return Err(CfgError::BadValue {
                name: spec.name.clone(),
                value: value.to_string(),
                reason: format!("length must be within {min}..={max}"),
            });
        }
    }
    *buf.borrow_mut() = value.to_string();
    Ok(())
}

/// Maps a single identifier value case-insensitively to an integer, given
/// the `(name, value)` pairs in [`SpecExt::EnumConstraint`].
pub fn enum_handler(spec: &Spec, entry: &Entry, _ctx: &mut DispatchCtx) -> Result<(), CfgError> {
    let value = single_value(spec, entry)?;
    let SpecExt::EnumConstraint(pairs) = &spec.spec_ext else {
        return Err(CfgError::BadValue {
            name: spec.name.clone(),
            value: value.to_string(),
            reason: "no enum mapping configured".to_string(),
        });
    };
    let Some((_, mapped)) = pairs.iter().find(|(name, _)| name.eq_ignore_ascii_case(value)) else {
        return Err(CfgError::BadValue {
            name: spec.name.clone(),
            value: value.to_string(),
            reason: "not a recognized enum value".to_string(),
        });
    };
    if let Dest::Enum(cell) = &spec.dest {
        cell.set(*mapped);
    }
    Ok(())
}

/// Accepts `{ ... }` bodies: validates no values, no attributes, and
/// `has_children == true`, then drives the parser over the block's body
/// against the child schema set in [`Dest::Block`] (spec §4.3's
/// "nested-block handler").
pub fn block_handler(spec: &Spec, entry: &Entry, ctx: &mut DispatchCtx) -> Result<(), CfgError> {
    if !entry.values.is_empty() || !entry.attributes.is_empty() || !entry.has_children {
        return Err(CfgError::BadValue {
            name: spec.name.clone(),
            value: String::new(),
            reason: "expected a `{ ... }` block with no values or attributes".to_string(),
        });
    }
    let Dest::Block(specs) = &spec.dest else {
        return Err(CfgError::BadValue {
            name: spec.name.clone(),
            value: String::new(),
            reason: "nested-block spec has no child schema".to_string(),
        });
    };
    dispatch_block(specs, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn ctx_over<'a>(source: &'a str, scratch: &'a mut crate::parser::EntryParser<'a>) -> DispatchCtx<'a, 'a> {
        DispatchCtx::new(scratch, source)
    }

    #[test]
    fn bool_handler_accepts_known_keywords_case_insensitively() {
        let cell = Rc::new(Cell::new(false));
        let spec = Spec::new("flag", bool_handler, Dest::Bool(cell.clone()));
        let entry = Entry {
            name: "flag".into(),
            values: vec!["DISABLE".into()],
            attributes: vec![],
            has_children: false,
        };
        let mut p = crate::parser::EntryParser::new("");
        let mut ctx = ctx_over("", &mut p);
        bool_handler(&spec, &entry, &mut ctx).unwrap();
        assert!(!cell.get());
    }

    #[test]
    fn bool_handler_rejects_unknown_keyword() {
        let cell = Rc::new(Cell::new(false));
        let spec = Spec::new("flag", bool_handler, Dest::Bool(cell));
        let entry = Entry {
            name: "flag".into(),
            values: vec!["maybe".into()],
            attributes: vec![],
            has_children: false,
        };
        let mut p = crate::parser::EntryParser::new("");
        let mut ctx = ctx_over("", &mut p);
        assert!(matches!(
            bool_handler(&spec, &entry, &mut ctx),
            Err(CfgError::BadValue { .. })
        ));
    }

    #[test]
    fn int_handler_parses_hex_and_binary_and_plain_leading_zero() {
        let cell = Rc::new(Cell::new(0));
        let spec = Spec::new("opt", int_handler, Dest::Int(cell.clone()));
        let mut p = crate::parser::EntryParser::new("");
        let mut ctx = ctx_over("", &mut p);

        let entry = |v: &str| Entry {
            name: "opt".into(),
            values: vec![v.to_string()],
            attributes: vec![],
            has_children: false,
        };

        int_handler(&spec, &entry("0x10"), &mut ctx).unwrap();
        assert_eq!(cell.get(), 16);
        int_handler(&spec, &entry("0b101"), &mut ctx).unwrap();
        assert_eq!(cell.get(), 5);
        int_handler(&spec, &entry("010"), &mut ctx).unwrap();
        assert_eq!(cell.get(), 10);
    }

    #[test]
    fn int_handler_enforces_range_and_multiple_of() {
        let cell = Rc::new(Cell::new(0));
        let spec = Spec::new("opt", int_handler, Dest::Int(cell))
            .with_ext(SpecExt::IntConstraint {
                range: Some((0, 10)),
                multiple_of: Some(2),
            });
        let mut p = crate::parser::EntryParser::new("");
        let mut ctx = ctx_over("", &mut p);

        let entry = |v: &str| Entry {
            name: "opt".into(),
            values: vec![v.to_string()],
            attributes: vec![],
            has_children: false,
        };

        assert!(matches!(
            int_handler(&spec, &entry("20"), &mut ctx),
            Err(CfgError::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            int_handler(&spec, &entry("3"), &mut ctx),
            Err(CfgError::BadValue { .. })
        ));
        assert!(int_handler(&spec, &entry("4"), &mut ctx).is_ok());
    }

    #[test]
    fn string_handler_rejects_overflow() {
        let buf = Rc::new(RefCell::new(String::new()));
        let spec = Spec::new("name", string_handler, Dest::StringBuf(buf.clone(), 3));
        let entry = Entry {
            name: "name".into(),
            values: vec!["abcd".into()],
            attributes: vec![],
            has_children: false,
        };
        let mut p = crate::parser::EntryParser::new("");
        let mut ctx = ctx_over("", &mut p);
        assert!(matches!(
            string_handler(&spec, &entry, &mut ctx),
            Err(CfgError::BadValue { .. })
        ));
    }

    #[test]
    fn enum_handler_maps_case_insensitively() {
        static PAIRS: &[(&str, i32)] = &[("low", 0), ("high", 1)];
        let cell = Rc::new(Cell::new(-1));
        let spec = Spec::new("level", enum_handler, Dest::Enum(cell.clone()))
            .with_ext(SpecExt::EnumConstraint(PAIRS));
        let entry = Entry {
            name: "level".into(),
            values: vec!["HIGH".into()],
            attributes: vec![],
            has_children: false,
        };
        let mut p = crate::parser::EntryParser::new("");
        let mut ctx = ctx_over("", &mut p);
        enum_handler(&spec, &entry, &mut ctx).unwrap();
        assert_eq!(cell.get(), 1);
    }

    #[test]
    fn block_handler_requires_empty_values_and_attrs_and_children_flag() {
        let child: Rc<Vec<Spec>> = Rc::new(vec![]);
        let spec = Spec::new("section", block_handler, Dest::Block(child));
        let bad_entry = Entry {
            name: "section".into(),
            values: vec!["oops".into()],
            attributes: vec![],
            has_children: true,
        };
        let mut p = crate::parser::EntryParser::new("");
        let mut ctx = ctx_over("", &mut p);
        assert!(matches!(
            block_handler(&spec, &bad_entry, &mut ctx),
            Err(CfgError::BadValue { .. })
        ));
    }

    #[test]
    fn nested_block_populates_child_destinations() {
        let a = Rc::new(Cell::new(0));
        let b = Rc::new(Cell::new(0));
        let child = Rc::new(vec![
            Spec::new("a", int_handler, Dest::Int(a.clone())),
            Spec::new("b", int_handler, Dest::Int(b.clone())),
        ]);
        let spec = Spec::new("section", block_handler, Dest::Block(child));

        let source = "section { a 1; b 2; }";
        let mut p = crate::parser::EntryParser::new(source);
        let entry = p.parse_entry().unwrap();
        let mut ctx = DispatchCtx::new(&mut p, source);
        block_handler(&spec, &entry, &mut ctx).unwrap();

        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);

        // Outer parse reports clean EOF after the block closes.
        let trailing = p.parse_entry().unwrap();
        assert!(trailing.name.is_empty());
    }

    #[test]
    fn unknown_nested_directive_is_rejected() {
        let a = Rc::new(Cell::new(0));
        let child = Rc::new(vec![Spec::new("a", int_handler, Dest::Int(a))]);
        let spec = Spec::new("section", block_handler, Dest::Block(child));

        let source = "section { a 1; c 3; }";
        let mut p = crate::parser::EntryParser::new(source);
        let entry = p.parse_entry().unwrap();
        let mut ctx = DispatchCtx::new(&mut p, source);
        assert!(matches!(
            block_handler(&spec, &entry, &mut ctx),
            Err(CfgError::UnknownDirective { .. })
        ));
    }
}
