//! Pass 1: walking one file's declarations into the model and the registry.

use tracing::debug;

use crate::data::{Enum, File, Message, TypeReference};
use crate::descriptor::{DescriptorProto, EnumDescriptorProto, FileDescriptorProto};
use crate::error::Result;
use crate::registry::{Registry, TypeInfo, TypeKind};

impl Registry {
    pub(crate) fn analyse_file(&mut self, f: &FileDescriptorProto) -> Result<File> {
        let name = f.name.clone().unwrap_or_default();
        let package = f.package.clone().unwrap_or_default();
        debug!(file = %name, package = %package, "analysing file");

        let mut file_data = File::new(&name, &package);

        for message in &f.message_type {
            self.analyse_message(&mut file_data, &package, &name, message, &[])?;
        }
        for enum_type in &f.enum_type {
            self.analyse_enum(&mut file_data, &package, &name, enum_type, &[]);
        }
        for service in &f.service {
            self.analyse_service(&mut file_data, &package, &name, service)?;
        }

        Ok(file_data)
    }

    fn analyse_message(
        &mut self,
        file_data: &mut File,
        package: &str,
        file_name: &str,
        m: &DescriptorProto,
        parents: &[String],
    ) -> Result<()> {
        let local_name = m.name.clone().unwrap_or_default();
        let fq_name = Registry::fq_name(package, parents, &local_name);
        let package_identifier = Registry::package_identifier(parents, &local_name);
        let is_map_entry = m
            .options
            .as_ref()
            .and_then(|o| o.map_entry)
            .unwrap_or(false);

        let kind = if is_map_entry {
            self.map_entry_kind(m, package)?
        } else {
            TypeKind::Message
        };

        self.register(TypeInfo {
            fq_name,
            package: package.to_string(),
            file: file_name.to_string(),
            package_identifier: package_identifier.clone(),
            local_identifier: local_name.clone(),
            kind,
        });

        let mut msg_data = Message::new(package_identifier);
        for field in &m.field {
            self.analyse_field(file_data, &mut msg_data, package, field)?;
        }

        // map entry pseudo-messages stay registry-only: their fields have
        // been walked above so external value types are tracked, but the
        // emitter renders them as Record types, never as interfaces
        if !is_map_entry {
            file_data.messages.push(msg_data);
        }

        let nested_parents: Vec<String> = parents
            .iter()
            .cloned()
            .chain(std::iter::once(local_name))
            .collect();
        for nested in &m.nested_type {
            self.analyse_message(file_data, package, file_name, nested, &nested_parents)?;
        }
        for nested_enum in &m.enum_type {
            self.analyse_enum(file_data, package, file_name, nested_enum, &nested_parents);
        }

        Ok(())
    }

    /// Key and value references of a map entry, taken from its two
    /// synthesized fields.
    fn map_entry_kind(&self, m: &DescriptorProto, package: &str) -> Result<TypeKind> {
        let mut key = None;
        let mut value = None;
        for field in &m.field {
            let kind = Registry::classify_field_kind(field)?;
            let external = kind
                .fq_name()
                .is_some_and(|fq| Registry::is_external_reference(fq, package));
            let reference = TypeReference::singular(kind, external);
            match field.number {
                Some(1) => key = Some(reference),
                Some(2) => value = Some(reference),
                _ => {}
            }
        }
        // map entries always carry exactly the two synthesized fields
        Ok(TypeKind::MapEntry {
            key: key.unwrap_or(TypeReference::singular(
                crate::data::FieldKind::Named(String::new()),
                false,
            )),
            value: value.unwrap_or(TypeReference::singular(
                crate::data::FieldKind::Named(String::new()),
                false,
            )),
        })
    }

    fn analyse_enum(
        &mut self,
        file_data: &mut File,
        package: &str,
        file_name: &str,
        e: &EnumDescriptorProto,
        parents: &[String],
    ) {
        let local_name = e.name.clone().unwrap_or_default();
        let fq_name = Registry::fq_name(package, parents, &local_name);
        let package_identifier = Registry::package_identifier(parents, &local_name);

        self.register(TypeInfo {
            fq_name,
            package: package.to_string(),
            file: file_name.to_string(),
            package_identifier: package_identifier.clone(),
            local_identifier: local_name,
            kind: TypeKind::Enum,
        });

        file_data.enums.push(Enum {
            name: package_identifier,
            values: e
                .value
                .iter()
                .map(|v| v.name.clone().unwrap_or_default())
                .collect(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FieldKind, ScalarKind};
    use crate::descriptor::field_descriptor_proto::Type as WireType;
    use crate::descriptor::{
        EnumValueDescriptorProto, FieldDescriptorProto, MessageOptions,
    };
    use crate::options::Options;

    fn string_field(name: &str, number: i32) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_string()),
            number: Some(number),
            r#type: Some(WireType::String as i32),
            ..Default::default()
        }
    }

    fn message_field(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_string()),
            number: Some(number),
            r#type: Some(WireType::Message as i32),
            type_name: Some(type_name.to_string()),
            ..Default::default()
        }
    }

    fn file_with_messages(messages: Vec<DescriptorProto>) -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some("test.proto".to_string()),
            package: Some("pkg".to_string()),
            message_type: messages,
            ..Default::default()
        }
    }

    #[test]
    fn nested_types_register_with_flattened_identifiers() {
        let mut reg = Registry::new(Options::default()).unwrap();
        let file = file_with_messages(vec![DescriptorProto {
            name: Some("Outer".to_string()),
            nested_type: vec![DescriptorProto {
                name: Some("Inner".to_string()),
                ..Default::default()
            }],
            enum_type: vec![EnumDescriptorProto {
                name: Some("Kind".to_string()),
                value: vec![EnumValueDescriptorProto {
                    name: Some("UNKNOWN".to_string()),
                    number: Some(0),
                }],
            }],
            ..Default::default()
        }]);

        let data = reg.analyse_file(&file).unwrap();

        let inner = reg.lookup(".pkg.Outer.Inner").unwrap();
        assert_eq!(inner.package_identifier, "OuterInner");
        assert_eq!(inner.local_identifier, "Inner");
        assert_eq!(inner.file, "test.proto");

        let kind = reg.lookup(".pkg.Outer.Kind").unwrap();
        assert_eq!(kind.kind, TypeKind::Enum);

        assert_eq!(data.messages.len(), 2);
        assert_eq!(data.enums.len(), 1);
        assert_eq!(data.enums[0].name, "OuterKind");
    }

    #[test]
    fn map_entries_register_key_value_and_stay_out_of_messages() {
        let mut reg = Registry::new(Options::default()).unwrap();
        let file = file_with_messages(vec![DescriptorProto {
            name: Some("Holder".to_string()),
            field: vec![message_field("labels", 1, ".pkg.Holder.LabelsEntry")],
            nested_type: vec![DescriptorProto {
                name: Some("LabelsEntry".to_string()),
                field: vec![
                    string_field("key", 1),
                    message_field("value", 2, ".other.Label"),
                ],
                options: Some(MessageOptions {
                    map_entry: Some(true),
                }),
                ..Default::default()
            }],
            ..Default::default()
        }]);

        let data = reg.analyse_file(&file).unwrap();

        // only Holder itself is emitted
        assert_eq!(data.messages.len(), 1);
        assert_eq!(data.messages[0].name, "Holder");

        let entry = reg.lookup(".pkg.Holder.LabelsEntry").unwrap();
        let TypeKind::MapEntry { key, value } = &entry.kind else {
            panic!("expected map entry kind");
        };
        assert_eq!(key.kind, FieldKind::Scalar(ScalarKind::String));
        assert_eq!(value.kind, FieldKind::Named(".other.Label".to_string()));
        assert!(value.external);

        // the external map value still surfaces as a file dependency seed
        assert!(data
            .external_types
            .contains(&".other.Label".to_string()));
    }
}
