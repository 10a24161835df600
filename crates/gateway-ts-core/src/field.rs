//! Field classification: one raw field descriptor in, one classified
//! [`Field`](crate::data::Field) out, appended to the owning message's lists.

use crate::data::{Field, FieldKind, File, Message, ScalarKind, TypeReference};
use crate::descriptor::field_descriptor_proto::{Label, Type as WireType};
use crate::descriptor::FieldDescriptorProto;
use crate::error::{AnalysisError, Result};
use crate::registry::Registry;

impl Registry {
    /// Derives the intermediate type of a field, leaving the rendering
    /// choice to the emitter: scalars map into the closed vocabulary,
    /// message/enum/group fields keep their fully qualified type name for
    /// later resolution.
    pub(crate) fn classify_field_kind(f: &FieldDescriptorProto) -> Result<FieldKind> {
        // an absent wire type names no concrete type; it is carried through
        // as an empty reference, which is never external
        let Some(raw) = f.r#type else {
            return Ok(FieldKind::Named(String::new()));
        };
        let wire = WireType::try_from(raw).map_err(|_| AnalysisError::UnsupportedFieldKind {
            field: f.name.clone().unwrap_or_default(),
            kind: raw,
        })?;

        match wire {
            WireType::Message | WireType::Enum | WireType::Group => {
                Ok(FieldKind::Named(f.type_name.clone().unwrap_or_default()))
            }
            scalar => ScalarKind::from_wire_type(scalar)
                .map(FieldKind::Scalar)
                .ok_or_else(|| AnalysisError::UnsupportedFieldKind {
                    field: f.name.clone().unwrap_or_default(),
                    kind: raw,
                }),
        }
    }

    pub(crate) fn analyse_field(
        &mut self,
        file_data: &mut File,
        msg_data: &mut Message,
        package: &str,
        f: &FieldDescriptorProto,
    ) -> Result<()> {
        let kind = Registry::classify_field_kind(f)?;
        let is_external = kind
            .fq_name()
            .is_some_and(|fq| Registry::is_external_reference(fq, package));
        let is_repeated = f.label == Some(Label::Repeated as i32);
        let is_optional = f.proto3_optional.unwrap_or(false);

        // external references are resolved in pass 2, once every file has
        // been analysed; until then only the name is recorded
        if is_external {
            if let Some(fq) = kind.fq_name() {
                file_data.external_types.push(fq.to_string());
            }
        }

        let field = Field {
            name: f.name.clone().unwrap_or_default(),
            type_ref: TypeReference {
                kind,
                repeated: is_repeated,
                external: is_external,
            },
            is_oneof: f.oneof_index.is_some(),
            oneof_index: None,
            is_optional,
            is_deprecated: f
                .options
                .as_ref()
                .and_then(|o| o.deprecated)
                .unwrap_or(false),
            json_name: f.json_name.clone().unwrap_or_default(),
        };

        let position = msg_data.fields.len();
        msg_data.fields.push(field);

        // proto3 optional fields are modeled as singleton oneofs in the
        // descriptor; they must not join real oneof grouping
        if let Some(index) = f.oneof_index {
            if !is_optional {
                msg_data.fields[position].oneof_index = Some(index);
                msg_data
                    .oneof_groups
                    .entry(index)
                    .or_default()
                    .push(position);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn field(name: &str, wire: WireType) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_string()),
            r#type: Some(wire as i32),
            ..Default::default()
        }
    }

    #[test]
    fn scalars_map_to_the_closed_vocabulary() {
        for (wire, want) in [
            (WireType::String, ScalarKind::String),
            (WireType::Bool, ScalarKind::Bool),
            (WireType::Bytes, ScalarKind::Bytes),
            (WireType::Sfixed64, ScalarKind::Sfixed64),
            (WireType::Uint32, ScalarKind::Uint32),
        ] {
            let kind = Registry::classify_field_kind(&field("f", wire)).unwrap();
            assert_eq!(kind, FieldKind::Scalar(want));
        }
    }

    #[test]
    fn message_fields_keep_their_type_name() {
        let mut f = field("entry", WireType::Message);
        f.type_name = Some(".other.Entry".to_string());
        let kind = Registry::classify_field_kind(&f).unwrap();
        assert_eq!(kind, FieldKind::Named(".other.Entry".to_string()));
    }

    #[test]
    fn unmapped_wire_kind_is_an_error() {
        let mut f = field("bad", WireType::String);
        f.r#type = Some(99);
        let err = Registry::classify_field_kind(&f).unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedFieldKind { kind: 99, .. }));
    }

    #[test]
    fn optional_fields_stay_out_of_oneof_groups() {
        let mut reg = Registry::new(Options::default()).unwrap();
        let mut file = File::new("t.proto", "pkg");
        let mut msg = Message::new("M".to_string());

        let mut optional = field("opt", WireType::String);
        optional.oneof_index = Some(0);
        optional.proto3_optional = Some(true);
        reg.analyse_field(&mut file, &mut msg, "pkg", &optional).unwrap();

        let mut grouped = field("choice_a", WireType::String);
        grouped.oneof_index = Some(1);
        reg.analyse_field(&mut file, &mut msg, "pkg", &grouped).unwrap();

        assert!(msg.fields[0].is_optional);
        assert!(msg.fields[0].is_oneof);
        assert_eq!(msg.fields[0].oneof_index, None);

        assert_eq!(msg.fields[1].oneof_index, Some(1));
        assert_eq!(msg.oneof_groups.get(&1), Some(&vec![1usize]));
        assert!(!msg.oneof_groups.contains_key(&0));
    }

    #[test]
    fn external_references_are_recorded_on_the_file() {
        let mut reg = Registry::new(Options::default()).unwrap();
        let mut file = File::new("t.proto", "pkg");
        let mut msg = Message::new("M".to_string());

        let mut external = field("remote", WireType::Message);
        external.type_name = Some(".other.Thing".to_string());
        reg.analyse_field(&mut file, &mut msg, "pkg", &external).unwrap();

        let mut local = field("here", WireType::Message);
        local.type_name = Some(".pkg.Thing".to_string());
        reg.analyse_field(&mut file, &mut msg, "pkg", &local).unwrap();

        assert_eq!(file.external_types, [".other.Thing"]);
        assert!(msg.fields[0].type_ref.external);
        assert!(!msg.fields[1].type_ref.external);
    }
}
