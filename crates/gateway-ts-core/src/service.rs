//! Pass 1: service analysis and HTTP binding extraction.

use tracing::debug;

use crate::data::{File, HttpVerb, Method, MethodArgument, Service, TypeReference};
use crate::descriptor::{http_rule, HttpRule, MethodDescriptorProto, ServiceDescriptorProto};
use crate::error::{AnalysisError, Result};
use crate::registry::{Registry, TypeInfo, TypeKind};

/// Verb and URL template of a rule's pattern. Exactly one of the five
/// supported patterns must be set.
fn extract_verb_and_url(rule: &HttpRule, method_name: &str) -> Result<(HttpVerb, String)> {
    match &rule.pattern {
        Some(http_rule::Pattern::Get(url)) => Ok((HttpVerb::Get, url.clone())),
        Some(http_rule::Pattern::Post(url)) => Ok((HttpVerb::Post, url.clone())),
        Some(http_rule::Pattern::Put(url)) => Ok((HttpVerb::Put, url.clone())),
        Some(http_rule::Pattern::Patch(url)) => Ok((HttpVerb::Patch, url.clone())),
        Some(http_rule::Pattern::Delete(url)) => Ok((HttpVerb::Delete, url.clone())),
        None => Err(AnalysisError::MalformedBinding {
            method: method_name.to_string(),
        }),
    }
}

/// GET bindings never carry a body; for everything else the rule's body
/// selector is used as-is (empty string meaning no body).
fn extract_body(rule: &HttpRule, verb: HttpVerb) -> String {
    match verb {
        HttpVerb::Get => String::new(),
        _ => rule.body.clone().unwrap_or_default(),
    }
}

/// Client-facing method name for one binding. The primary binding always
/// keeps the bare RPC name; additional bindings append the title-cased verb
/// and, on a collision with any already-assigned name, a counter.
fn binding_client_name(
    rpc_name: &str,
    verb: HttpVerb,
    binding_index: usize,
    existing: &[Method],
) -> String {
    if binding_index == 0 {
        return rpc_name.to_string();
    }

    let base = format!("{rpc_name}{}", verb.title());
    let collisions = existing
        .iter()
        .filter(|m| m.client_method_name.starts_with(&base))
        .count();
    if collisions > 0 {
        return format!("{base}{}", collisions + 1);
    }
    base
}

fn method_from_rule(
    method: &MethodDescriptorProto,
    rule: &HttpRule,
    binding_index: usize,
    existing: &[Method],
    input: MethodArgument,
    output: MethodArgument,
) -> Result<Method> {
    let name = method.name.clone().unwrap_or_default();
    let (verb, url) = extract_verb_and_url(rule, &name)?;
    let body = extract_body(rule, verb);
    let client_method_name = binding_client_name(&name, verb, binding_index, existing);

    Ok(Method {
        name,
        url,
        input,
        output,
        server_streaming: method.server_streaming.unwrap_or(false),
        http_verb: verb,
        http_request_body: Some(body),
        binding_index,
        client_method_name,
    })
}

impl Registry {
    pub(crate) fn analyse_service(
        &mut self,
        file_data: &mut File,
        package: &str,
        file_name: &str,
        service: &ServiceDescriptorProto,
    ) -> Result<()> {
        let service_name = service.name.clone().unwrap_or_default();
        let fq_name = Registry::fq_name(package, &[], &service_name);

        self.register(TypeInfo {
            fq_name,
            package: package.to_string(),
            file: file_name.to_string(),
            package_identifier: service_name.clone(),
            local_identifier: service_name.clone(),
            kind: TypeKind::Service,
        });

        let mut service_data = Service {
            name: service_name.clone(),
            methods: Vec::new(),
        };
        let service_url_part = if package.is_empty() {
            service_name.clone()
        } else {
            format!("{package}.{service_name}")
        };

        for method in &service.method {
            // client streaming has no HTTP mapping; those methods are
            // dropped from the generated surface entirely
            if method.client_streaming.unwrap_or(false) {
                debug!(
                    method = method.name.as_deref().unwrap_or(""),
                    "skipping client streaming method"
                );
                continue;
            }

            let method_name = method.name.clone().unwrap_or_default();
            let input_fq = method.input_type.clone().unwrap_or_default();
            let output_fq = method.output_type.clone().unwrap_or_default();

            for (fq, _) in [(&input_fq, "input"), (&output_fq, "output")] {
                if Registry::is_external_reference(fq, package) {
                    file_data.external_types.push(fq.clone());
                }
            }

            let argument = |fq: &String| MethodArgument {
                type_ref: TypeReference::singular(
                    crate::data::FieldKind::Named(fq.clone()),
                    Registry::is_external_reference(fq, package),
                ),
            };

            match method.options.as_ref().and_then(|o| o.http.as_ref()) {
                Some(rule) => {
                    let primary = method_from_rule(
                        method,
                        rule,
                        0,
                        &service_data.methods,
                        argument(&input_fq),
                        argument(&output_fq),
                    )?;
                    service_data.methods.push(primary);

                    for (idx, additional) in rule.additional_bindings.iter().enumerate() {
                        let binding = method_from_rule(
                            method,
                            additional,
                            idx + 1,
                            &service_data.methods,
                            argument(&input_fq),
                            argument(&output_fq),
                        )?;
                        service_data.methods.push(binding);
                    }
                }
                None => {
                    // unannotated methods keep the legacy behavior: POST to
                    // /package.Service/Method with the whole request as body
                    service_data.methods.push(Method {
                        name: method_name.clone(),
                        url: format!("/{service_url_part}/{method_name}"),
                        input: argument(&input_fq),
                        output: argument(&output_fq),
                        server_streaming: method.server_streaming.unwrap_or(false),
                        http_verb: HttpVerb::Post,
                        http_request_body: None,
                        binding_index: 0,
                        client_method_name: method_name,
                    });
                }
            }
        }

        file_data.services.push(service_data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::MethodOptions;
    use crate::options::Options;

    fn rpc(name: &str, rule: Option<HttpRule>) -> MethodDescriptorProto {
        MethodDescriptorProto {
            name: Some(name.to_string()),
            input_type: Some(".pkg.Req".to_string()),
            output_type: Some(".pkg.Resp".to_string()),
            options: rule.map(|http| MethodOptions { http: Some(http) }),
            ..Default::default()
        }
    }

    fn get_rule(url: &str) -> HttpRule {
        HttpRule {
            pattern: Some(http_rule::Pattern::Get(url.to_string())),
            ..Default::default()
        }
    }

    fn analyse(service: ServiceDescriptorProto) -> (Registry, File) {
        let mut reg = Registry::new(Options::default()).unwrap();
        let mut file = File::new("counter.proto", "pkg");
        reg.analyse_service(&mut file, "pkg", "counter.proto", &service)
            .unwrap();
        (reg, file)
    }

    #[test]
    fn unannotated_method_synthesizes_legacy_binding() {
        let (_, file) = analyse(ServiceDescriptorProto {
            name: Some("Counter".to_string()),
            method: vec![rpc("Increment", None)],
        });

        let method = &file.services[0].methods[0];
        assert_eq!(method.url, "/pkg.Counter/Increment");
        assert_eq!(method.http_verb, HttpVerb::Post);
        assert_eq!(method.http_request_body, None);
        assert_eq!(method.client_method_name, "Increment");
    }

    #[test]
    fn get_bindings_never_carry_a_body() {
        let mut rule = get_rule("/v1/count");
        rule.body = Some("*".to_string());
        let (_, file) = analyse(ServiceDescriptorProto {
            name: Some("Counter".to_string()),
            method: vec![rpc("Fetch", Some(rule))],
        });

        let method = &file.services[0].methods[0];
        assert_eq!(method.http_verb, HttpVerb::Get);
        assert_eq!(method.http_request_body.as_deref(), Some(""));
    }

    #[test]
    fn missing_pattern_is_a_malformed_binding() {
        let mut reg = Registry::new(Options::default()).unwrap();
        let mut file = File::new("counter.proto", "pkg");
        let err = reg
            .analyse_service(
                &mut file,
                "pkg",
                "counter.proto",
                &ServiceDescriptorProto {
                    name: Some("Counter".to_string()),
                    method: vec![rpc("Broken", Some(HttpRule::default()))],
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::MalformedBinding { method } if method == "Broken"
        ));
    }

    #[test]
    fn additional_bindings_get_unique_client_names() {
        let mut rule = get_rule("/v1/thing");
        rule.additional_bindings = vec![
            HttpRule {
                pattern: Some(http_rule::Pattern::Post("/v1/thing".to_string())),
                body: Some("*".to_string()),
                ..Default::default()
            },
            HttpRule {
                pattern: Some(http_rule::Pattern::Post("/v2/thing".to_string())),
                body: Some("*".to_string()),
                ..Default::default()
            },
            HttpRule {
                pattern: Some(http_rule::Pattern::Post("/v3/thing".to_string())),
                body: Some("*".to_string()),
                ..Default::default()
            },
        ];
        let (_, file) = analyse(ServiceDescriptorProto {
            name: Some("Things".to_string()),
            method: vec![rpc("Fetch", Some(rule))],
        });

        let names: Vec<_> = file.services[0]
            .methods
            .iter()
            .map(|m| m.client_method_name.as_str())
            .collect();
        assert_eq!(names, ["Fetch", "FetchPost", "FetchPost2", "FetchPost3"]);
        let indices: Vec<_> = file.services[0]
            .methods
            .iter()
            .map(|m| m.binding_index)
            .collect();
        assert_eq!(indices, [0, 1, 2, 3]);
    }

    #[test]
    fn client_streaming_methods_are_dropped() {
        let mut method = rpc("Upload", None);
        method.client_streaming = Some(true);
        let (_, file) = analyse(ServiceDescriptorProto {
            name: Some("Counter".to_string()),
            method: vec![method, rpc("Increment", None)],
        });

        let names: Vec<_> = file.services[0]
            .methods
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, ["Increment"]);
    }

    #[test]
    fn external_method_arguments_seed_file_dependencies() {
        let mut reg = Registry::new(Options::default()).unwrap();
        let mut file = File::new("svc.proto", "pkg");
        let mut method = rpc("Lookup", None);
        method.input_type = Some(".other.Query".to_string());
        reg.analyse_service(
            &mut file,
            "pkg",
            "svc.proto",
            &ServiceDescriptorProto {
                name: Some("Finder".to_string()),
                method: vec![method],
            },
        )
        .unwrap();

        assert_eq!(file.external_types, [".other.Query"]);
        assert!(file.services[0].methods[0].input.type_ref.external);
        assert!(!file.services[0].methods[0].output.type_ref.external);
    }
}
