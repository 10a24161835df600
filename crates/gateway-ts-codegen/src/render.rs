//! Direct string-building renderer for one generated TypeScript file.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use gateway_ts_core::casing::function_case;
use gateway_ts_core::data::{
    well_known_type, Enum, Field, FieldKind, File, Message, Method, ScalarKind, Service,
    TypeReference,
};
use gateway_ts_core::paths;
use gateway_ts_core::url::{body_accessor, render_url};
use gateway_ts_core::{Options, Registry, TypeKind};

/// Compound-type helpers emitted into every file that renders oneof groups.
const ONEOF_HELPERS: &str = r#"type Absent<T, K extends keyof T> = { [k in Exclude<keyof T, K>]?: undefined };
type OneOf<T> =
  | { [k in keyof T]?: undefined }
  | (keyof T extends infer K ?
      (K extends string & keyof T ? { [k in K]: T[K] } & Absent<T, K> : never)
    : never);"#;

pub(crate) fn styling_header(options: &Options) -> &'static str {
    if options.enable_styling_check {
        "/* eslint-disable @typescript-eslint/consistent-type-definitions */\n"
    } else {
        "/* eslint-disable */\n// @ts-nocheck\n"
    }
}

pub(crate) fn render_file(registry: &Registry, file: &File) -> Result<String> {
    if file.is_empty() {
        return Ok("export default {}\n".to_string());
    }

    let options = &registry.options;
    let mut out = String::new();

    out.push_str(styling_header(options));
    out.push_str("/*\n* This file is generated by the gateway TypeScript generator.\n* DO NOT MODIFY\n*/\n");

    if file.requires_fetch_module() {
        let fm_path = fetch_module_import_path(options, file)?;
        writeln!(out, "import * as fm from \"{fm_path}\"")?;
    }
    for dep in &file.dependencies {
        writeln!(
            out,
            "import * as {} from \"{}\"",
            dep.module_identifier, dep.source_file
        )?;
    }

    if file.messages.iter().any(|m| !m.oneof_groups.is_empty()) {
        out.push('\n');
        out.push_str(ONEOF_HELPERS);
        out.push('\n');
    }

    for enum_data in &file.enums {
        out.push('\n');
        render_enum(&mut out, enum_data)?;
    }
    for message in &file.messages {
        out.push('\n');
        render_message(&mut out, registry, message)?;
    }
    for service in &file.services {
        out.push('\n');
        render_service(&mut out, registry, service)?;
    }

    Ok(format!("{}\n", out.trim_end()))
}

/// Import path of the shared fetch module as seen from `file`'s directory.
fn fetch_module_import_path(options: &Options, file: &File) -> Result<String> {
    let module = Path::new(&options.fetch_module_directory).join(&options.fetch_module_filename);
    let abs_module = paths::absolute(&module)
        .with_context(|| format!("resolving fetch module path {}", module.display()))?;
    let abs_file = paths::absolute(Path::new(&file.ts_file_name))
        .with_context(|| format!("resolving output path {}", file.ts_file_name))?;
    let base_dir = abs_file.parent().unwrap_or(Path::new("/"));
    let rel = paths::relative(base_dir, &abs_module)
        .context("computing relative path to the fetch module")?;

    let slash_path = paths::to_slash(&rel);
    let prefixed = if slash_path.starts_with("../") {
        slash_path
    } else {
        format!("./{slash_path}")
    };
    Ok(paths::strip_ts_suffix(&prefixed))
}

fn render_enum(out: &mut String, enum_data: &Enum) -> Result<()> {
    writeln!(out, "export enum {} {{", enum_data.name)?;
    for value in &enum_data.values {
        writeln!(out, "  {value} = \"{value}\",")?;
    }
    out.push_str("}\n");
    Ok(())
}

fn render_message(out: &mut String, registry: &Registry, message: &Message) -> Result<()> {
    let options = &registry.options;
    let has_groups = !message.oneof_groups.is_empty();
    let type_name = if has_groups {
        format!("Base{}", message.name)
    } else {
        message.name.clone()
    };
    let declaration = if has_groups { "type" } else { "export type" };

    writeln!(out, "{declaration} {type_name} = {{")?;
    for field in message.non_oneof_fields().chain(message.optional_fields()) {
        writeln!(
            out,
            "  {}: {}",
            ts_type_key(options, field),
            ts_type_def(registry, field)?
        )?;
    }
    out.push_str("}\n");

    if has_groups {
        write!(out, "\nexport type {} = Base{}", message.name, message.name)?;
        for index in message.oneof_groups.keys() {
            let members: Vec<String> = message
                .oneof_group_fields(*index)
                .map(|f| {
                    Ok::<_, anyhow::Error>(format!(
                        "{}: {}",
                        options.field_key(f),
                        ts_type(registry, &f.type_ref)?
                    ))
                })
                .collect::<Result<_>>()?;
            write!(out, "\n  & OneOf<{{ {} }}>", members.join("; "))?;
        }
        out.push('\n');
    }
    Ok(())
}

/// Object key of a field in the generated shape. Unless the gateway emits
/// zero values, every non-required field may be absent; optional fields may
/// be absent either way.
fn ts_type_key(options: &Options, field: &Field) -> String {
    let name = options.field_key(field);
    if !options.emit_unpopulated || field.is_optional {
        format!("{name}?")
    } else {
        name
    }
}

fn ts_type_def(registry: &Registry, field: &Field) -> Result<String> {
    let rendered = ts_type(registry, &field.type_ref)?;
    // with emit_unpopulated the gateway sends zero values, so only messages
    // and lists remain nullable
    if registry.options.emit_unpopulated
        && (!field.type_ref.kind.is_scalar() || field.type_ref.repeated)
    {
        return Ok(format!("{rendered} | null"));
    }
    Ok(rendered)
}

fn ts_type(registry: &Registry, reference: &TypeReference) -> Result<String> {
    let rendered = match &reference.kind {
        FieldKind::Scalar(scalar) => scalar_ts_type(*scalar).to_string(),
        FieldKind::Named(fq_name) => {
            if let Some(native) = well_known_type(fq_name) {
                native.to_string()
            } else {
                let info = registry.lookup(fq_name)?;
                if let TypeKind::MapEntry { key, value } = &info.kind {
                    // map entries render as records; the repeated label on
                    // the wire field does not make them arrays
                    return Ok(format!(
                        "Record<{}, {}>",
                        ts_type(registry, key)?,
                        ts_type(registry, value)?
                    ));
                }
                if reference.external {
                    format!(
                        "{}.{}",
                        gateway_ts_core::data::module_name(&info.package, &info.file),
                        info.package_identifier
                    )
                } else {
                    info.package_identifier.clone()
                }
            }
        }
    };

    if reference.repeated {
        Ok(format!("{rendered}[]"))
    } else {
        Ok(rendered)
    }
}

fn scalar_ts_type(scalar: ScalarKind) -> &'static str {
    match scalar {
        // 64-bit integers lose precision in a JS number, the gateway sends
        // them as strings
        ScalarKind::Int64
        | ScalarKind::Sint64
        | ScalarKind::Uint64
        | ScalarKind::Fixed64
        | ScalarKind::Sfixed64
        | ScalarKind::String => "string",
        ScalarKind::Float
        | ScalarKind::Double
        | ScalarKind::Int32
        | ScalarKind::Sint32
        | ScalarKind::Uint32
        | ScalarKind::Fixed32
        | ScalarKind::Sfixed32 => "number",
        ScalarKind::Bool => "boolean",
        ScalarKind::Bytes => "Uint8Array",
    }
}

fn render_service(out: &mut String, registry: &Registry, service: &Service) -> Result<()> {
    let options = &registry.options;
    if options.use_static_classes {
        writeln!(out, "export class {} {{", service.name)?;
        for method in &service.methods {
            render_method(out, registry, service, method, "  static ")?;
        }
        out.push_str("}\n");
    } else {
        for (i, method) in service.methods.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let prefix = format!("export function {}", function_case(&service.name));
            render_method(out, registry, service, method, &prefix)?;
        }
    }
    Ok(())
}

fn render_method(
    out: &mut String,
    registry: &Registry,
    service: &Service,
    method: &Method,
    prefix: &str,
) -> Result<()> {
    let options = &registry.options;
    let input = ts_type(registry, &method.input.type_ref)?;
    let output = ts_type(registry, &method.output.type_ref)?;
    let rendered = render_url(options, method);
    let init = build_init_req(options, method);

    writeln!(
        out,
        "  /**\n   * {} {} - {} {}\n   */",
        service.name,
        method.name,
        method.http_verb.as_str(),
        escape_jsdoc(&method.url)
    )?;

    if method.server_streaming {
        writeln!(
            out,
            "{prefix}{}(req: {input}, entityNotifier?: fm.NotifyStreamEntityArrival<{output}>, initReq?: fm.InitReq): Promise<void> {{",
            method.client_method_name
        )?;
        writeln!(
            out,
            "    return fm.fetchStreamingRequest<{input}, {output}>(`{}`, entityNotifier, {{...initReq, {init}}})",
            rendered.expression
        )?;
    } else {
        writeln!(
            out,
            "{prefix}{}(req: {input}, initReq?: fm.InitReq): Promise<{output}> {{",
            method.client_method_name
        )?;
        writeln!(
            out,
            "    return fm.fetchReq<{input}, {output}>(`{}`, {{...initReq, {init}}})",
            rendered.expression
        )?;
    }
    out.push_str("  }\n");
    Ok(())
}

/// The RequestInit fields of one call: HTTP method plus, when the binding
/// carries one, the serialized body.
pub(crate) fn build_init_req(options: &Options, method: &Method) -> String {
    let mut fields = vec![format!("method: \"{}\"", method.http_verb.as_str())];
    if let Some(accessor) = body_accessor(options, method.http_request_body.as_deref()) {
        fields.push(format!("body: JSON.stringify({accessor}, fm.replacer)"));
    }
    fields.join(", ")
}

/// Escapes `*/` sequences in URL templates so wildcard patterns survive
/// inside JSDoc comments.
pub(crate) fn escape_jsdoc(url: &str) -> String {
    url.replace("*/", "*\\/")
}
