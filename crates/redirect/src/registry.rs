//! 필드 레지스트리 -- 인식하는 어노테이션 필드의 고정 테이블
//!
//! 각 [`Field`]는 외부 어노테이션 키, 기본값, [`Validator`]를 가집니다.
//! [`FieldRegistry`]는 시작 시 한 번 구성되고 이후 읽기 전용이므로 동기화가 필요 없습니다.
//! 기본값은 [`RedirectDefaults`]에서 오며, 내장 기본값으로 구성된 레지스트리는
//! [`FieldRegistry::standard`]로 얻을 수 있습니다.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::Serialize;

use meshcni_core::config::RedirectSettings;

use crate::error::RedirectError;
use crate::validate::Validator;

/// 사이드카 주입 여부 어노테이션 키
pub const INJECT_KEY: &str = "sidecar.istio.io/inject";
/// 사이드카 주입 상태 어노테이션 키
pub const STATUS_KEY: &str = "sidecar.istio.io/status";
/// 인터셉션 모드 어노테이션 키
pub const INTERCEPTION_MODE_KEY: &str = "sidecar.istio.io/interceptionMode";
/// 사이드카 포트 목록 어노테이션 키
pub const SIDECAR_PORTS_KEY: &str = "status.sidecar.istio.io/port";
/// outbound 포함 CIDR 어노테이션 키
pub const INCLUDE_IP_CIDRS_KEY: &str = "traffic.sidecar.istio.io/includeOutboundIPRanges";
/// outbound 제외 CIDR 어노테이션 키
pub const EXCLUDE_IP_CIDRS_KEY: &str = "traffic.sidecar.istio.io/excludeOutboundIPRanges";
/// inbound 포함 포트 어노테이션 키
pub const INCLUDE_PORTS_KEY: &str = "traffic.sidecar.istio.io/includeInboundPorts";
/// inbound 제외 포트 어노테이션 키
pub const EXCLUDE_PORTS_KEY: &str = "traffic.sidecar.istio.io/excludeInboundPorts";
/// kubevirt 인터페이스 어노테이션 키
pub const KUBEVIRT_INTERFACES_KEY: &str = "traffic.sidecar.istio.io/kubevirtInterfaces";

/// 인식하는 논리 필드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Field {
    /// 사이드카 주입 여부 (통과 필드)
    #[serde(rename = "inject")]
    Inject,
    /// 사이드카 주입 상태 (통과 필드)
    #[serde(rename = "status")]
    Status,
    /// 인터셉션 모드
    #[serde(rename = "redirectMode")]
    RedirectMode,
    /// 사이드카가 선언한 포트 목록
    #[serde(rename = "ports")]
    Ports,
    /// outbound 포함 CIDR
    #[serde(rename = "includeIPCidrs")]
    IncludeIpCidrs,
    /// outbound 제외 CIDR
    #[serde(rename = "excludeIPCidrs")]
    ExcludeIpCidrs,
    /// inbound 포함 포트
    #[serde(rename = "includePorts")]
    IncludePorts,
    /// inbound 제외 포트
    #[serde(rename = "excludePorts")]
    ExcludePorts,
    /// 리다이렉트에서 제외할 kubevirt 인터페이스
    #[serde(rename = "kubevirtInterfaces")]
    KubevirtInterfaces,
}

impl Field {
    /// 모든 필드 (선언 순서 = 레지스트리 인덱스)
    pub const ALL: [Field; 9] = [
        Field::Inject,
        Field::Status,
        Field::RedirectMode,
        Field::Ports,
        Field::IncludeIpCidrs,
        Field::ExcludeIpCidrs,
        Field::IncludePorts,
        Field::ExcludePorts,
        Field::KubevirtInterfaces,
    ];

    /// 논리 필드 이름
    pub fn name(self) -> &'static str {
        match self {
            Self::Inject => "inject",
            Self::Status => "status",
            Self::RedirectMode => "redirectMode",
            Self::Ports => "ports",
            Self::IncludeIpCidrs => "includeIPCidrs",
            Self::ExcludeIpCidrs => "excludeIPCidrs",
            Self::IncludePorts => "includePorts",
            Self::ExcludePorts => "excludePorts",
            Self::KubevirtInterfaces => "kubevirtInterfaces",
        }
    }

    /// 외부 어노테이션 키
    pub fn annotation_key(self) -> &'static str {
        match self {
            Self::Inject => INJECT_KEY,
            Self::Status => STATUS_KEY,
            Self::RedirectMode => INTERCEPTION_MODE_KEY,
            Self::Ports => SIDECAR_PORTS_KEY,
            Self::IncludeIpCidrs => INCLUDE_IP_CIDRS_KEY,
            Self::ExcludeIpCidrs => EXCLUDE_IP_CIDRS_KEY,
            Self::IncludePorts => INCLUDE_PORTS_KEY,
            Self::ExcludePorts => EXCLUDE_PORTS_KEY,
            Self::KubevirtInterfaces => KUBEVIRT_INTERFACES_KEY,
        }
    }

    /// 값 도메인 검증기
    pub fn validator(self) -> Validator {
        match self {
            Self::Inject | Self::Status | Self::KubevirtInterfaces => Validator::AlwaysValid,
            Self::RedirectMode => Validator::InterceptionMode,
            Self::Ports | Self::ExcludePorts => Validator::PortList,
            Self::IncludeIpCidrs => Validator::CidrListWithWildcard,
            Self::ExcludeIpCidrs => Validator::CidrList,
            Self::IncludePorts => Validator::PortListWithWildcard,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = RedirectError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.name() == name)
            .ok_or_else(|| RedirectError::UnknownField(name.to_owned()))
    }
}

/// 리다이렉트 기본값
///
/// 어노테이션이 없을 때 사용하는 프로세스 전역 불변 값입니다.
/// 한 번 구성한 뒤 [`FieldRegistry`]가 소유합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectDefaults {
    /// 프록시 리다이렉트 대상 포트 (어노테이션으로 바꿀 수 없음)
    pub target_port: String,
    /// proxy UID 미지정 시 제외할 UID
    pub no_redirect_uid: String,
    /// 인터셉션 모드
    pub redirect_mode: String,
    /// outbound 포함 CIDR
    pub include_ip_cidrs: String,
    /// outbound 제외 CIDR
    pub exclude_ip_cidrs: String,
    /// inbound 제외 포트 (프록시 상태 포트)
    pub exclude_ports: String,
    /// kubevirt 인터페이스
    pub kubevirt_interfaces: String,
}

impl Default for RedirectDefaults {
    fn default() -> Self {
        Self::from_settings_unchecked(&RedirectSettings::default())
    }
}

impl RedirectDefaults {
    /// 설정 파일의 `[redirect]` 섹션에서 기본값을 구성합니다.
    ///
    /// 각 기본값은 해당 필드의 검증기를 통과해야 합니다. 기본값이 잘못되면
    /// 어노테이션이 없는 모든 워크로드가 잘못된 인자로 실행되기 때문입니다.
    pub fn from_settings(settings: &RedirectSettings) -> Result<Self, RedirectError> {
        let defaults = Self::from_settings_unchecked(settings);

        let checks = [
            (
                "redirect.redirect_mode",
                Field::RedirectMode,
                &defaults.redirect_mode,
            ),
            (
                "redirect.include_ip_cidrs",
                Field::IncludeIpCidrs,
                &defaults.include_ip_cidrs,
            ),
            (
                "redirect.exclude_ip_cidrs",
                Field::ExcludeIpCidrs,
                &defaults.exclude_ip_cidrs,
            ),
            (
                "redirect.proxy_status_port",
                Field::ExcludePorts,
                &defaults.exclude_ports,
            ),
        ];
        for (setting, field, value) in checks {
            field
                .validator()
                .validate(value)
                .map_err(|e| RedirectError::Config {
                    field: setting.to_owned(),
                    reason: e.to_string(),
                })?;
        }

        Ok(defaults)
    }

    fn from_settings_unchecked(settings: &RedirectSettings) -> Self {
        Self {
            target_port: settings.target_port.clone(),
            no_redirect_uid: settings.no_redirect_uid.clone(),
            redirect_mode: settings.redirect_mode.clone(),
            include_ip_cidrs: settings.include_ip_cidrs.clone(),
            exclude_ip_cidrs: settings.exclude_ip_cidrs.clone(),
            exclude_ports: settings.proxy_status_port.clone(),
            kubevirt_interfaces: settings.kubevirt_interfaces.clone(),
        }
    }

    /// 필드의 정적 기본값
    ///
    /// `includePorts`는 정적 기본값이 없으므로 빈 문자열이며,
    /// 실제 대체값은 빌더가 컨테이너 포트로 채웁니다.
    pub fn value_for(&self, field: Field) -> &str {
        match field {
            Field::Inject | Field::Status | Field::Ports | Field::IncludePorts => "",
            Field::RedirectMode => &self.redirect_mode,
            Field::IncludeIpCidrs => &self.include_ip_cidrs,
            Field::ExcludeIpCidrs => &self.exclude_ip_cidrs,
            Field::ExcludePorts => &self.exclude_ports,
            Field::KubevirtInterfaces => &self.kubevirt_interfaces,
        }
    }
}

/// 단일 필드 명세
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    field: Field,
    key: &'static str,
    default_value: String,
    validator: Validator,
}

impl FieldSpec {
    fn new(field: Field, defaults: &RedirectDefaults) -> Self {
        Self {
            field,
            key: field.annotation_key(),
            default_value: defaults.value_for(field).to_owned(),
            validator: field.validator(),
        }
    }

    /// 논리 필드
    pub fn field(&self) -> Field {
        self.field
    }

    /// 외부 어노테이션 키
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// 기본값
    pub fn default_value(&self) -> &str {
        &self.default_value
    }

    /// 검증기
    pub fn validator(&self) -> Validator {
        self.validator
    }
}

static STANDARD_REGISTRY: LazyLock<FieldRegistry> =
    LazyLock::new(|| FieldRegistry::new(RedirectDefaults::default()));

/// 필드 레지스트리
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    specs: [FieldSpec; 9],
    defaults: RedirectDefaults,
}

impl FieldRegistry {
    /// 주어진 기본값으로 레지스트리를 구성합니다.
    pub fn new(defaults: RedirectDefaults) -> Self {
        let specs = Field::ALL.map(|field| FieldSpec::new(field, &defaults));
        Self { specs, defaults }
    }

    /// 내장 기본값으로 구성된 프로세스 전역 레지스트리
    pub fn standard() -> &'static FieldRegistry {
        &STANDARD_REGISTRY
    }

    /// 필드 명세를 반환합니다.
    pub fn spec(&self, field: Field) -> &FieldSpec {
        &self.specs[field.index()]
    }

    /// 논리 필드 이름으로 명세를 찾습니다.
    ///
    /// # Errors
    ///
    /// 등록되지 않은 이름이면 `RedirectError::UnknownField`
    pub fn lookup(&self, name: &str) -> Result<&FieldSpec, RedirectError> {
        let field: Field = name.parse()?;
        Ok(self.spec(field))
    }

    /// 레지스트리가 사용하는 기본값
    pub fn defaults(&self) -> &RedirectDefaults {
        &self.defaults
    }

    /// 모든 필드 명세를 선언 순서대로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.specs.iter()
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new(RedirectDefaults::default())
    }
}
