//! 설정 관리 — meshcni.toml 파싱 및 런타임 설정
//!
//! [`MeshcniConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`MESHCNI_REDIRECT_TARGET_PORT=15006` 형식)
//! 3. 설정 파일 (`meshcni.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), meshcni_core::error::MeshcniError> {
//! use meshcni_core::config::MeshcniConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = MeshcniConfig::load("meshcni.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = MeshcniConfig::parse("[redirect]\ntarget_port = \"15006\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, MeshcniError};

/// meshcni 통합 설정
///
/// `meshcni.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshcniConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 리다이렉트 기본값 및 외부 도구 경로
    #[serde(default)]
    pub redirect: RedirectSettings,
}

impl MeshcniConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, MeshcniError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드, 검증 없음).
    ///
    /// 값 검증은 오버라이드 적용 후 [`load`](Self::load)에서 수행합니다.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, MeshcniError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MeshcniError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                MeshcniError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, MeshcniError> {
        toml::from_str(toml_str).map_err(|e| {
            MeshcniError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `MESHCNI_{SECTION}_{FIELD}`
    /// 예: `MESHCNI_REDIRECT_NO_REDIRECT_UID=1337`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "MESHCNI_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "MESHCNI_GENERAL_LOG_FORMAT");

        // Redirect
        override_string(
            &mut self.redirect.target_port,
            "MESHCNI_REDIRECT_TARGET_PORT",
        );
        override_string(
            &mut self.redirect.no_redirect_uid,
            "MESHCNI_REDIRECT_NO_REDIRECT_UID",
        );
        override_string(
            &mut self.redirect.redirect_mode,
            "MESHCNI_REDIRECT_REDIRECT_MODE",
        );
        override_string(
            &mut self.redirect.proxy_status_port,
            "MESHCNI_REDIRECT_PROXY_STATUS_PORT",
        );
        override_string(
            &mut self.redirect.include_ip_cidrs,
            "MESHCNI_REDIRECT_INCLUDE_IP_CIDRS",
        );
        override_string(
            &mut self.redirect.exclude_ip_cidrs,
            "MESHCNI_REDIRECT_EXCLUDE_IP_CIDRS",
        );
        override_string(
            &mut self.redirect.kubevirt_interfaces,
            "MESHCNI_REDIRECT_KUBEVIRT_INTERFACES",
        );
        override_string(
            &mut self.redirect.nsenter_path,
            "MESHCNI_REDIRECT_NSENTER_PATH",
        );
        override_string(
            &mut self.redirect.setup_bin_dir,
            "MESHCNI_REDIRECT_SETUP_BIN_DIR",
        );
        override_string(&mut self.redirect.setup_prog, "MESHCNI_REDIRECT_SETUP_PROG");
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 어노테이션 도메인 검증(인터셉션 모드, CIDR 목록)은 레지스트리를 구성하는
    /// `meshcni-redirect`에서 수행하고, 여기서는 구조적인 값만 확인합니다.
    pub fn validate(&self) -> Result<(), MeshcniError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        validate_port("redirect.target_port", &self.redirect.target_port)?;
        validate_port(
            "redirect.proxy_status_port",
            &self.redirect.proxy_status_port,
        )?;

        if self.redirect.no_redirect_uid.parse::<u32>().is_err() {
            return Err(ConfigError::InvalidValue {
                field: "redirect.no_redirect_uid".to_owned(),
                reason: format!(
                    "must be a decimal uid, got '{}'",
                    self.redirect.no_redirect_uid
                ),
            }
            .into());
        }

        for (field, value) in [
            ("redirect.nsenter_path", &self.redirect.nsenter_path),
            ("redirect.setup_bin_dir", &self.redirect.setup_bin_dir),
            ("redirect.setup_prog", &self.redirect.setup_prog),
        ] {
            if value.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_owned(),
                    reason: "must not be empty".to_owned(),
                }
                .into());
            }
        }

        Ok(())
    }
}

fn validate_port(field: &str, value: &str) -> Result<(), MeshcniError> {
    value.parse::<u16>().map(|_| ()).map_err(|_| {
        ConfigError::InvalidValue {
            field: field.to_owned(),
            reason: format!("must be a port number 0-65535, got '{value}'"),
        }
        .into()
    })
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 리다이렉트 설정
///
/// 어노테이션이 없을 때 사용되는 프로세스 전역 기본값과
/// 외부 네임스페이스 리다이렉트 도구의 위치를 담습니다.
/// 값은 모두 외부 도구 인자로 그대로 전달되므로 문자열로 보관합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectSettings {
    /// 트래픽을 리다이렉트할 프록시 포트
    pub target_port: String,
    /// 리다이렉트에서 제외할 프록시 UID (proxy UID 미지정 시)
    pub no_redirect_uid: String,
    /// 인터셉션 모드 기본값 (REDIRECT, TPROXY)
    pub redirect_mode: String,
    /// 프록시 상태 포트 (inbound 제외 포트 기본값)
    pub proxy_status_port: String,
    /// outbound 포함 CIDR 기본값 (`*` = 전체)
    pub include_ip_cidrs: String,
    /// outbound 제외 CIDR 기본값
    pub exclude_ip_cidrs: String,
    /// 리다이렉트에서 제외할 kubevirt 인터페이스 기본값
    pub kubevirt_interfaces: String,
    /// 네임스페이스 진입 도구 경로
    pub nsenter_path: String,
    /// 리다이렉트 설정 스크립트 디렉토리
    pub setup_bin_dir: String,
    /// 리다이렉트 설정 스크립트 이름
    pub setup_prog: String,
}

impl Default for RedirectSettings {
    fn default() -> Self {
        Self {
            target_port: "15001".to_owned(),
            no_redirect_uid: "1337".to_owned(),
            redirect_mode: "REDIRECT".to_owned(),
            proxy_status_port: "15020".to_owned(),
            include_ip_cidrs: "*".to_owned(),
            exclude_ip_cidrs: String::new(),
            kubevirt_interfaces: String::new(),
            nsenter_path: "nsenter".to_owned(),
            setup_bin_dir: "/opt/cni/bin".to_owned(),
            setup_prog: "istio-iptables.sh".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        if val.is_empty() && !target.is_empty() {
            warn!(env_key, "env var set to empty string, overriding default");
        }
        *target = val;
    }
}
