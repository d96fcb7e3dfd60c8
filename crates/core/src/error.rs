//! 에러 타입 — 도메인별 에러 정의

/// meshcni 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum MeshcniError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 리다이렉트 구성/실행 에러
    #[error("redirect error: {0}")]
    Redirect(#[from] RedirectFailure),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 리다이렉트 도메인 에러의 상위 레이어 표현
///
/// `meshcni-redirect`의 상세 에러는 이 타입으로 변환되어 전파됩니다.
#[derive(Debug, thiserror::Error)]
pub enum RedirectFailure {
    /// 어노테이션 값이 필드 도메인에 맞지 않음
    #[error("invalid annotation for '{field}': {reason}")]
    InvalidAnnotation { field: String, reason: String },

    /// 등록되지 않은 필드 이름 (호출측 프로그래밍 오류)
    #[error("no registered annotation with name={0}")]
    UnknownField(String),

    /// 외부 리다이렉트 도구를 시작할 수 없음
    #[error("redirect tool unavailable: {0}")]
    ToolUnavailable(String),

    /// 외부 리다이렉트 도구 실행 실패
    #[error("redirect invocation failed for netns '{netns}': {reason}")]
    InvocationFailed { netns: String, reason: String },
}
