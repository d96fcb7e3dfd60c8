//! 리다이렉트 에러 타입
//!
//! [`RedirectError`]는 어노테이션 해석, 구성 생성, 외부 도구 실행 중 발생하는
//! 모든 에러를 표현합니다. `From<RedirectError> for MeshcniError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use meshcni_core::error::{MeshcniError, RedirectFailure};

use crate::redirect::RedirectConfig;
use crate::registry::Field;
use crate::validate::ValueError;

/// 어노테이션 값 검증 실패
///
/// 리졸버가 생성하며, 거부된 원본 값과 대신 사용된 기본값을 함께 담습니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value '{value}' for {field} (using '{fallback}'): {source}")]
pub struct ValidationError {
    /// 대상 필드
    pub field: Field,
    /// 거부된 원본 값
    pub value: String,
    /// 대신 사용된 기본값
    pub fallback: String,
    /// 검증기 에러
    pub source: ValueError,
}

/// 리다이렉트 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum RedirectError {
    /// 등록되지 않은 필드 이름
    #[error("no registered annotation with name={0}")]
    UnknownField(String),

    /// 어노테이션 값 에러로 구성 생성 중단
    ///
    /// `includePorts` 뒤의 필드가 실패하면 앞서 거부된 `includePorts` 에러도
    /// `include_ports`에 함께 담깁니다.
    #[error(
        "annotation value error for value {field}; annotation_found = {annotation_found}: {source}{}",
        describe_include_ports(.include_ports)
    )]
    Annotation {
        /// 문제가 된 필드
        field: Field,
        /// 어노테이션 키 존재 여부
        annotation_found: bool,
        /// 검증 에러
        source: ValidationError,
        /// 함께 거부된 includePorts 값
        include_ports: Option<Box<ValidationError>>,
    },

    /// includePorts 값이 잘못되어 컨테이너 포트로 대체된 구성
    ///
    /// 구성 자체는 완성되어 `fallback`에 담겨 있으며, 사용 여부는 호출측이 결정합니다.
    #[error(
        "invalid includePorts annotation, fell back to container ports '{}': {source}",
        .container_ports.join(",")
    )]
    IncludePortsFallback {
        /// 대체값으로 사용된 컨테이너 포트
        container_ports: Vec<String>,
        /// 검증 에러
        source: ValidationError,
        /// 컨테이너 포트로 완성된 구성
        fallback: Box<RedirectConfig>,
    },

    /// 외부 도구 프로세스를 시작할 수 없음
    #[error("failed to spawn '{program}': {reason}")]
    Spawn {
        /// 실행하려던 프로그램
        program: String,
        /// 실패 사유
        reason: String,
    },

    /// 외부 도구가 실패 상태로 종료
    #[error(
        "redirect invocation failed for netns '{netns}' ({}): {output}",
        describe_status(.status)
    )]
    InvocationFailed {
        /// 대상 네트워크 네임스페이스
        netns: String,
        /// 종료 코드 (시그널로 종료되면 None)
        status: Option<i32>,
        /// 결합된 stdout/stderr
        output: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_owned(),
    }
}

fn describe_include_ports(include_ports: &Option<Box<ValidationError>>) -> String {
    match include_ports {
        Some(err) => format!("; also {err}"),
        None => String::new(),
    }
}

impl RedirectError {
    /// includePorts 대체 구성을 참조합니다.
    pub fn fallback_config(&self) -> Option<&RedirectConfig> {
        match self {
            Self::IncludePortsFallback { fallback, .. } => Some(fallback),
            _ => None,
        }
    }

    /// includePorts 대체 구성을 꺼냅니다. 다른 에러는 그대로 돌려줍니다.
    pub fn into_fallback_config(self) -> Result<RedirectConfig, RedirectError> {
        match self {
            Self::IncludePortsFallback { fallback, .. } => Ok(*fallback),
            other => Err(other),
        }
    }

    /// 거부된 includePorts 값의 검증 에러
    ///
    /// 대체 구성 에러뿐 아니라, 이후 필드 에러에 함께 실린 경우도 돌려줍니다.
    pub fn include_ports_error(&self) -> Option<&ValidationError> {
        match self {
            Self::IncludePortsFallback { source, .. } => Some(source),
            Self::Annotation { include_ports, .. } => include_ports.as_deref(),
            _ => None,
        }
    }

    /// 앞서 거부된 includePorts 에러를 어노테이션 에러에 붙입니다.
    pub(crate) fn with_include_ports(self, port_error: Option<ValidationError>) -> Self {
        match self {
            Self::Annotation {
                field,
                annotation_found,
                source,
                include_ports: None,
            } => Self::Annotation {
                field,
                annotation_found,
                source,
                include_ports: port_error.map(Box::new),
            },
            other => other,
        }
    }

    /// 어노테이션 값 검증 에러인지 여부
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Annotation { .. } | Self::IncludePortsFallback { .. }
        )
    }

    /// 검증 에러의 대상 필드
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::Annotation { field, .. } => Some(*field),
            Self::IncludePortsFallback { .. } => Some(Field::IncludePorts),
            _ => None,
        }
    }
}

impl From<RedirectError> for MeshcniError {
    fn from(err: RedirectError) -> Self {
        match &err {
            RedirectError::UnknownField(name) => {
                MeshcniError::Redirect(RedirectFailure::UnknownField(name.clone()))
            }
            RedirectError::Annotation { field, source, .. } => {
                MeshcniError::Redirect(RedirectFailure::InvalidAnnotation {
                    field: field.to_string(),
                    reason: source.to_string(),
                })
            }
            RedirectError::IncludePortsFallback { source, .. } => {
                MeshcniError::Redirect(RedirectFailure::InvalidAnnotation {
                    field: Field::IncludePorts.to_string(),
                    reason: source.to_string(),
                })
            }
            RedirectError::Spawn { .. } => {
                MeshcniError::Redirect(RedirectFailure::ToolUnavailable(err.to_string()))
            }
            RedirectError::InvocationFailed { netns, status, .. } => {
                MeshcniError::Redirect(RedirectFailure::InvocationFailed {
                    netns: netns.clone(),
                    reason: describe_status(status),
                })
            }
            RedirectError::Config { field, reason } => {
                MeshcniError::Config(meshcni_core::error::ConfigError::InvalidValue {
                    field: field.clone(),
                    reason: reason.clone(),
                })
            }
        }
    }
}
