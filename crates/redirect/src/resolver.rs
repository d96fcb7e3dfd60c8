//! 어노테이션 리졸버
//!
//! 필드 하나와 워크로드의 원본 어노테이션 맵을 받아 [`ResolvedField`]를 만듭니다.
//! 결과는 세 가지 경우로 나뉘며 `Result`로 합치지 않습니다.
//!
//! | 어노테이션 | 검증 | found | value | error |
//! |-----------|------|-------|-------|-------|
//! | 있음 | 통과 | true | 원본 값 | None |
//! | 있음 | 실패 | true | 기본값 | Some |
//! | 없음 | - | false | 기본값 | None |

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::error::{RedirectError, ValidationError};
use crate::registry::{Field, FieldRegistry};

/// 필드 하나의 해석 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedField {
    /// 어노테이션 키가 존재했는지 여부
    pub found: bool,
    /// 사용할 값 (검증 실패 시 기본값)
    pub value: String,
    /// 검증 실패 시 에러
    #[serde(skip)]
    pub error: Option<ValidationError>,
}

impl ResolvedField {
    /// 유효한 어노테이션 값이 사용되었는지 여부
    pub fn is_annotated(&self) -> bool {
        self.found && self.error.is_none()
    }
}

/// 어노테이션 리졸버
#[derive(Debug, Clone, Copy)]
pub struct AnnotationResolver<'a> {
    registry: &'a FieldRegistry,
}

impl Default for AnnotationResolver<'static> {
    fn default() -> Self {
        Self::new(FieldRegistry::standard())
    }
}

impl<'a> AnnotationResolver<'a> {
    /// 레지스트리를 참조하는 리졸버를 생성합니다.
    pub fn new(registry: &'a FieldRegistry) -> Self {
        Self { registry }
    }

    /// 리졸버가 참조하는 레지스트리
    pub fn registry(&self) -> &'a FieldRegistry {
        self.registry
    }

    /// 필드를 해석합니다.
    pub fn resolve(&self, field: Field, annotations: &HashMap<String, String>) -> ResolvedField {
        let spec = self.registry.spec(field);

        let Some(raw) = annotations.get(spec.key()) else {
            return ResolvedField {
                found: false,
                value: spec.default_value().to_owned(),
                error: None,
            };
        };

        match spec.validator().validate(raw) {
            Ok(()) => ResolvedField {
                found: true,
                value: raw.clone(),
                error: None,
            },
            Err(source) => {
                debug!(
                    field = %field,
                    value = %raw,
                    error = %source,
                    "annotation value rejected by validator"
                );
                ResolvedField {
                    found: true,
                    value: spec.default_value().to_owned(),
                    error: Some(ValidationError {
                        field,
                        value: raw.clone(),
                        fallback: spec.default_value().to_owned(),
                        source,
                    }),
                }
            }
        }
    }

    /// 논리 필드 이름으로 해석합니다.
    ///
    /// # Errors
    ///
    /// 등록되지 않은 이름이면 `RedirectError::UnknownField`
    pub fn resolve_named(
        &self,
        name: &str,
        annotations: &HashMap<String, String>,
    ) -> Result<ResolvedField, RedirectError> {
        let spec = self.registry.lookup(name)?;
        Ok(self.resolve(spec.field(), annotations))
    }

    /// 모든 등록 필드를 선언 순서대로 해석합니다.
    pub fn resolve_all(&self, annotations: &HashMap<String, String>) -> Vec<(Field, ResolvedField)> {
        Field::ALL
            .into_iter()
            .map(|field| (field, self.resolve(field, annotations)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{INCLUDE_IP_CIDRS_KEY, INCLUDE_PORTS_KEY, INTERCEPTION_MODE_KEY};
    use crate::validate::ValueError;

    fn annotations(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn absent_key_yields_default() {
        let resolver = AnnotationResolver::default();
        let resolved = resolver.resolve(Field::RedirectMode, &HashMap::new());
        assert_eq!(
            resolved,
            ResolvedField {
                found: false,
                value: "REDIRECT".to_owned(),
                error: None,
            }
        );
        assert!(!resolved.is_annotated());
    }

    #[test]
    fn every_field_resolves_to_default_when_absent() {
        let resolver = AnnotationResolver::default();
        let empty = HashMap::new();
        for (field, resolved) in resolver.resolve_all(&empty) {
            let spec = resolver.registry().spec(field);
            assert!(!resolved.found);
            assert!(resolved.error.is_none());
            assert_eq!(resolved.value, spec.default_value());
        }
    }

    #[test]
    fn valid_annotation_is_used_verbatim() {
        let resolver = AnnotationResolver::default();
        let resolved = resolver.resolve(
            Field::RedirectMode,
            &annotations(&[(INTERCEPTION_MODE_KEY, "TPROXY")]),
        );
        assert!(resolved.found);
        assert_eq!(resolved.value, "TPROXY");
        assert!(resolved.error.is_none());
        assert!(resolved.is_annotated());
    }

    #[test]
    fn invalid_annotation_yields_default_and_error() {
        let resolver = AnnotationResolver::default();
        let resolved = resolver.resolve(
            Field::RedirectMode,
            &annotations(&[(INTERCEPTION_MODE_KEY, "BOGUS")]),
        );
        assert!(resolved.found);
        assert_eq!(resolved.value, "REDIRECT");
        let err = resolved.error.unwrap();
        assert_eq!(err.field, Field::RedirectMode);
        assert_eq!(err.value, "BOGUS");
        assert_eq!(err.fallback, "REDIRECT");
        assert_eq!(err.source, ValueError::InterceptionMode("BOGUS".to_owned()));
    }

    #[test]
    fn empty_string_annotation_counts_as_found() {
        let resolver = AnnotationResolver::default();
        let resolved = resolver.resolve(
            Field::IncludeIpCidrs,
            &annotations(&[(INCLUDE_IP_CIDRS_KEY, "")]),
        );
        assert!(resolved.found);
        assert_eq!(resolved.value, "");
        assert!(resolved.error.is_none());
    }

    #[test]
    fn wildcard_include_ports_is_valid() {
        let resolver = AnnotationResolver::default();
        let resolved =
            resolver.resolve(Field::IncludePorts, &annotations(&[(INCLUDE_PORTS_KEY, "*")]));
        assert!(resolved.is_annotated());
        assert_eq!(resolved.value, "*");
    }

    #[test]
    fn resolve_named_known_and_unknown() {
        let resolver = AnnotationResolver::default();
        let map = annotations(&[(INTERCEPTION_MODE_KEY, "TPROXY")]);
        let resolved = resolver.resolve_named("redirectMode", &map).unwrap();
        assert_eq!(resolved.value, "TPROXY");

        let err = resolver.resolve_named("interceptionMode", &map).unwrap_err();
        assert!(matches!(err, RedirectError::UnknownField(_)));
    }

    #[test]
    fn unrelated_annotations_are_ignored() {
        let resolver = AnnotationResolver::default();
        let map = annotations(&[("app.kubernetes.io/name", "web")]);
        let resolved = resolver.resolve(Field::ExcludePorts, &map);
        assert!(!resolved.found);
        assert_eq!(resolved.value, "15020");
    }
}
