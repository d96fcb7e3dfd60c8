//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//! exporter 설치는 이 크레이트의 범위 밖이며, 레코더가 없으면 기록은 무시됩니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `meshcni_`
//! - 모듈명: `redirect_`, `annotation_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(meshcni_core::metrics::REDIRECT_INVOCATIONS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 어노테이션 필드 레이블 키 (redirectMode, includePorts, ...)
pub const LABEL_FIELD: &str = "field";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Redirect 메트릭 ───────────────────────────────────────────────

/// Redirect: 외부 리다이렉트 도구 실행 수 (counter, label: result)
pub const REDIRECT_INVOCATIONS_TOTAL: &str = "meshcni_redirect_invocations_total";

/// Redirect: 외부 리다이렉트 도구 실행 실패 수 (counter)
pub const REDIRECT_INVOCATION_FAILURES_TOTAL: &str = "meshcni_redirect_invocation_failures_total";

/// Redirect: 에러 없이 생성된 리다이렉트 구성 수 (counter)
pub const REDIRECT_CONFIGS_BUILT_TOTAL: &str = "meshcni_redirect_configs_built_total";

// ─── Annotation 메트릭 ─────────────────────────────────────────────

/// Annotation: 검증 실패 수 (counter, label: field)
pub const ANNOTATION_VALIDATION_FAILURES_TOTAL: &str =
    "meshcni_annotation_validation_failures_total";

/// Annotation: 잘못된 includePorts 값이 컨테이너 포트로 대체된 횟수 (counter)
///
/// 어노테이션이 없어 컨테이너 포트를 쓰는 경우는 세지 않습니다.
pub const ANNOTATION_PORT_FALLBACKS_TOTAL: &str = "meshcni_annotation_port_fallbacks_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::describe_counter;

    describe_counter!(
        REDIRECT_INVOCATIONS_TOTAL,
        "Total number of redirect tool invocations by result"
    );
    describe_counter!(
        REDIRECT_INVOCATION_FAILURES_TOTAL,
        "Total number of redirect tool invocations that failed or could not start"
    );
    describe_counter!(
        REDIRECT_CONFIGS_BUILT_TOTAL,
        "Total number of redirect configurations built without annotation errors"
    );
    describe_counter!(
        ANNOTATION_VALIDATION_FAILURES_TOTAL,
        "Total number of annotation values rejected by their field validator"
    );
    describe_counter!(
        ANNOTATION_PORT_FALLBACKS_TOTAL,
        "Total number of invalid include-ports annotations replaced by declared container ports"
    );
}
