//! 리다이렉트 구성과 빌더
//!
//! [`RedirectConfigBuilder`]는 모든 필드에 대해 리졸버를 실행하여
//! 불변 [`RedirectConfig`]를 만듭니다. 필드는 다음 순서로 해석됩니다.
//!
//! 1. `redirectMode`
//! 2. proxy UID (어노테이션이 아닌 호출측 값)
//! 3. `includeIPCidrs`
//! 4. `includePorts` (컨테이너 포트로 대체 가능)
//! 5. `excludeIPCidrs`
//! 6. `excludePorts`
//! 7. `kubevirtInterfaces`
//!
//! `includePorts`를 제외한 필드의 검증 에러는 즉시 생성을 중단합니다.
//! `includePorts`가 잘못된 경우 나머지 필드를 모두 해석한 뒤
//! [`RedirectError::IncludePortsFallback`]에 완성된 구성을 담아 반환합니다.
//! 이후 필드도 실패하면 그 필드의 [`RedirectError::Annotation`]에
//! `includePorts` 에러가 함께 실립니다.

use std::collections::HashMap;

use metrics::counter;
use serde::Serialize;
use tracing::{debug, warn};

use meshcni_core::metrics as m;

use crate::error::RedirectError;
use crate::registry::{Field, FieldRegistry};
use crate::resolver::{AnnotationResolver, ResolvedField};

/// 워크로드 하나의 리다이렉트 구성
///
/// 생성 후 변경할 수 없습니다. 모든 값은 외부 도구에 그대로 전달되는 문자열입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectConfig {
    target_port: String,
    redirect_mode: String,
    no_redirect_uid: String,
    #[serde(rename = "includeIPCidrs")]
    include_ip_cidrs: String,
    include_ports: String,
    exclude_ports: String,
    #[serde(rename = "excludeIPCidrs")]
    exclude_ip_cidrs: String,
    kubevirt_interfaces: String,
}

impl RedirectConfig {
    /// 표준 레지스트리로 어노테이션에서 구성을 생성합니다.
    ///
    /// [`RedirectConfigBuilder`]의 축약형입니다.
    pub fn from_annotations(
        proxy_uid: Option<i64>,
        container_ports: &[String],
        annotations: &HashMap<String, String>,
    ) -> Result<Self, RedirectError> {
        let mut builder = RedirectConfigBuilder::new()
            .container_ports(container_ports.to_vec())
            .annotations(annotations.clone());
        if let Some(uid) = proxy_uid {
            builder = builder.proxy_uid(uid);
        }
        builder.build()
    }

    /// 프록시 리다이렉트 대상 포트
    pub fn target_port(&self) -> &str {
        &self.target_port
    }

    /// 인터셉션 모드 (`REDIRECT` 또는 `TPROXY`)
    pub fn redirect_mode(&self) -> &str {
        &self.redirect_mode
    }

    /// 리다이렉트에서 제외할 UID
    pub fn no_redirect_uid(&self) -> &str {
        &self.no_redirect_uid
    }

    /// outbound 포함 CIDR
    pub fn include_ip_cidrs(&self) -> &str {
        &self.include_ip_cidrs
    }

    /// inbound 포함 포트
    pub fn include_ports(&self) -> &str {
        &self.include_ports
    }

    /// inbound 제외 포트
    pub fn exclude_ports(&self) -> &str {
        &self.exclude_ports
    }

    /// outbound 제외 CIDR
    pub fn exclude_ip_cidrs(&self) -> &str {
        &self.exclude_ip_cidrs
    }

    /// kubevirt 인터페이스
    pub fn kubevirt_interfaces(&self) -> &str {
        &self.kubevirt_interfaces
    }
}

/// 리다이렉트 구성 빌더
///
/// # 사용 예시
///
/// ```ignore
/// use meshcni_redirect::RedirectConfigBuilder;
///
/// let config = RedirectConfigBuilder::new()
///     .proxy_uid(1337)
///     .container_ports(vec!["8080".to_owned()])
///     .annotation("sidecar.istio.io/interceptionMode", "TPROXY")
///     .build()?;
/// ```
pub struct RedirectConfigBuilder<'a> {
    registry: &'a FieldRegistry,
    proxy_uid: Option<i64>,
    container_ports: Vec<String>,
    annotations: HashMap<String, String>,
    target_port: Option<String>,
}

impl RedirectConfigBuilder<'static> {
    /// 표준 레지스트리를 사용하는 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::with_registry(FieldRegistry::standard())
    }
}

impl Default for RedirectConfigBuilder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> RedirectConfigBuilder<'a> {
    /// 주어진 레지스트리를 사용하는 빌더를 생성합니다.
    pub fn with_registry(registry: &'a FieldRegistry) -> Self {
        Self {
            registry,
            proxy_uid: None,
            container_ports: Vec::new(),
            annotations: HashMap::new(),
            target_port: None,
        }
    }

    /// 프록시 UID를 지정합니다. 지정하지 않으면 기본 UID를 사용합니다.
    pub fn proxy_uid(mut self, uid: i64) -> Self {
        self.proxy_uid = Some(uid);
        self
    }

    /// 워크로드가 선언한 컨테이너 포트를 설정합니다 (순서 유지).
    pub fn container_ports(mut self, ports: Vec<String>) -> Self {
        self.container_ports = ports;
        self
    }

    /// 원본 어노테이션 맵을 설정합니다.
    pub fn annotations(mut self, annotations: HashMap<String, String>) -> Self {
        self.annotations = annotations;
        self
    }

    /// 어노테이션 하나를 추가합니다. 같은 키는 덮어씁니다.
    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// 리다이렉트 대상 포트를 덮어씁니다.
    pub fn target_port(mut self, port: impl Into<String>) -> Self {
        self.target_port = Some(port.into());
        self
    }

    /// 구성을 생성합니다.
    ///
    /// # Errors
    ///
    /// - `Annotation`: `includePorts` 외 필드의 어노테이션 값이 잘못됨
    /// - `IncludePortsFallback`: `includePorts` 값만 잘못됨, 컨테이너 포트로 완성된 구성 포함
    pub fn build(self) -> Result<RedirectConfig, RedirectError> {
        let resolver = AnnotationResolver::new(self.registry);
        let defaults = self.registry.defaults();
        let annotations = &self.annotations;

        let redirect_mode = strict(&resolver, Field::RedirectMode, annotations)?;

        let no_redirect_uid = match self.proxy_uid {
            Some(uid) => uid.to_string(),
            None => defaults.no_redirect_uid.clone(),
        };

        let include_ip_cidrs = strict(&resolver, Field::IncludeIpCidrs, annotations)?;

        let ports = resolver.resolve(Field::IncludePorts, annotations);
        let (include_ports, port_error) = if ports.is_annotated() {
            (ports.value, None)
        } else {
            let joined = self.container_ports.join(",");
            if let Some(err) = &ports.error {
                counter!(m::ANNOTATION_PORT_FALLBACKS_TOTAL).increment(1);
                counter!(
                    m::ANNOTATION_VALIDATION_FAILURES_TOTAL,
                    m::LABEL_FIELD => Field::IncludePorts.name()
                )
                .increment(1);
                warn!(
                    value = %err.value,
                    error = %err.source,
                    container_ports = %joined,
                    "invalid includePorts annotation, using container ports"
                );
            }
            (joined, ports.error)
        };

        let remaining = (|| {
            Ok::<_, RedirectError>((
                strict(&resolver, Field::ExcludeIpCidrs, annotations)?,
                strict(&resolver, Field::ExcludePorts, annotations)?,
                strict(&resolver, Field::KubevirtInterfaces, annotations)?,
            ))
        })();
        let (exclude_ip_cidrs, exclude_ports, kubevirt_interfaces) =
            remaining.map_err(|e| e.with_include_ports(port_error.clone()))?;

        let config = RedirectConfig {
            target_port: self
                .target_port
                .unwrap_or_else(|| defaults.target_port.clone()),
            redirect_mode,
            no_redirect_uid,
            include_ip_cidrs,
            include_ports,
            exclude_ports,
            exclude_ip_cidrs,
            kubevirt_interfaces,
        };
        match port_error {
            Some(source) => Err(RedirectError::IncludePortsFallback {
                container_ports: self.container_ports,
                source,
                fallback: Box::new(config),
            }),
            None => {
                counter!(m::REDIRECT_CONFIGS_BUILT_TOTAL).increment(1);
                debug!(config = ?config, "redirect config built");
                Ok(config)
            }
        }
    }
}

fn strict(
    resolver: &AnnotationResolver<'_>,
    field: Field,
    annotations: &HashMap<String, String>,
) -> Result<String, RedirectError> {
    let ResolvedField {
        found,
        value,
        error,
    } = resolver.resolve(field, annotations);

    match error {
        None => Ok(value),
        Some(source) => {
            counter!(
                m::ANNOTATION_VALIDATION_FAILURES_TOTAL,
                m::LABEL_FIELD => field.name()
            )
            .increment(1);
            Err(RedirectError::Annotation {
                field,
                annotation_found: found,
                source,
                include_ports: None,
            })
        }
    }
}
