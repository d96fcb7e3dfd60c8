//! 어노테이션 값 검증기
//!
//! [`Validator`]는 필드별 값 도메인을 나타내는 닫힌 열거형입니다.
//! 모든 검증은 순수 함수이며 입력을 변경하거나 부수효과를 일으키지 않습니다.

use std::fmt;

use ipnet::IpNet;
use serde::Serialize;

/// iptables REDIRECT 기반 인터셉션 모드
pub const REDIRECT_MODE_REDIRECT: &str = "REDIRECT";
/// TPROXY 기반 인터셉션 모드
pub const REDIRECT_MODE_TPROXY: &str = "TPROXY";
/// "전체"를 의미하는 와일드카드 토큰
pub const WILDCARD: &str = "*";

/// 검증기가 거부한 값에 대한 설명
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// 허용되지 않은 인터셉션 모드
    #[error("interceptionMode invalid: {0}")]
    InterceptionMode(String),

    /// CIDR 목록의 항목 파싱 실패
    #[error("failed parsing cidr '{entry}': {reason}")]
    Cidr {
        /// 문제가 된 항목
        entry: String,
        /// 실패 사유
        reason: String,
    },

    /// 포트 목록의 항목 파싱 실패
    #[error("failed parsing port '{entry}': {reason}")]
    Port {
        /// 문제가 된 항목
        entry: String,
        /// 실패 사유
        reason: String,
    },
}

impl ValueError {
    /// 검증을 실패시킨 값(목록이면 해당 항목)을 반환합니다.
    pub fn offending_entry(&self) -> &str {
        match self {
            Self::InterceptionMode(mode) => mode,
            Self::Cidr { entry, .. } | Self::Port { entry, .. } => entry,
        }
    }
}

/// 필드 값 도메인 검증기
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Validator {
    /// 모든 문자열 허용 (자유 형식 필드)
    AlwaysValid,
    /// `REDIRECT` 또는 `TPROXY`
    InterceptionMode,
    /// 콤마 구분 CIDR 목록, 빈 문자열 허용
    CidrList,
    /// CIDR 목록 또는 `*`
    CidrListWithWildcard,
    /// 콤마 구분 포트 목록 (0-65535), 빈 문자열 허용
    PortList,
    /// 포트 목록 또는 `*`
    PortListWithWildcard,
}

impl Validator {
    /// 값이 이 검증기의 도메인에 속하는지 확인합니다.
    pub fn validate(self, value: &str) -> Result<(), ValueError> {
        if self.accepts_wildcard() && value == WILDCARD {
            return Ok(());
        }
        match self {
            Self::AlwaysValid => Ok(()),
            Self::InterceptionMode => validate_interception_mode(value),
            Self::CidrList | Self::CidrListWithWildcard => validate_cidr_list(value),
            Self::PortList | Self::PortListWithWildcard => parse_ports(value).map(|_| ()),
        }
    }

    /// `*` 와일드카드를 허용하는 검증기인지 여부
    pub fn accepts_wildcard(self) -> bool {
        matches!(self, Self::CidrListWithWildcard | Self::PortListWithWildcard)
    }

    /// 로그/출력용 고정 이름
    pub fn name(self) -> &'static str {
        match self {
            Self::AlwaysValid => "always_valid",
            Self::InterceptionMode => "interception_mode",
            Self::CidrList => "cidr_list",
            Self::CidrListWithWildcard => "cidr_list_with_wildcard",
            Self::PortList => "port_list",
            Self::PortListWithWildcard => "port_list_with_wildcard",
        }
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn validate_interception_mode(mode: &str) -> Result<(), ValueError> {
    match mode {
        REDIRECT_MODE_REDIRECT | REDIRECT_MODE_TPROXY => Ok(()),
        other => Err(ValueError::InterceptionMode(other.to_owned())),
    }
}

/// 콤마 구분 CIDR 목록을 검증합니다.
///
/// 항목은 공백 제거 없이 그대로 파싱하며, 호스트 비트가 설정된 주소(`10.0.0.1/8`)도
/// 허용합니다. 첫 번째로 실패한 항목을 에러에 담습니다.
pub fn validate_cidr_list(cidrs: &str) -> Result<(), ValueError> {
    if cidrs.is_empty() {
        return Ok(());
    }
    for cidr in cidrs.split(',') {
        cidr.parse::<IpNet>().map_err(|e| ValueError::Cidr {
            entry: cidr.to_owned(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

/// 콤마 구분 포트 목록을 파싱합니다.
///
/// 전체 문자열과 각 항목의 앞뒤 공백은 무시합니다. 빈 문자열은 빈 목록입니다.
pub fn parse_ports(ports: &str) -> Result<Vec<u16>, ValueError> {
    let ports = ports.trim();
    if ports.is_empty() {
        return Ok(Vec::new());
    }
    ports.split(',').map(parse_port).collect()
}

fn parse_port(entry: &str) -> Result<u16, ValueError> {
    let trimmed = entry.trim();
    // u16::from_str 는 '+' 접두어를 허용하므로 숫자만 직접 확인
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValueError::Port {
            entry: trimmed.to_owned(),
            reason: "not an unsigned decimal integer".to_owned(),
        });
    }
    trimmed.parse::<u16>().map_err(|_| ValueError::Port {
        entry: trimmed.to_owned(),
        reason: "out of range 0-65535".to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interception_mode_accepts_both_tokens() {
        assert!(Validator::InterceptionMode.validate("REDIRECT").is_ok());
        assert!(Validator::InterceptionMode.validate("TPROXY").is_ok());
    }

    #[test]
    fn interception_mode_is_case_sensitive() {
        let err = Validator::InterceptionMode
            .validate("redirect")
            .unwrap_err();
        assert_eq!(err, ValueError::InterceptionMode("redirect".to_owned()));
        assert!(Validator::InterceptionMode.validate("").is_err());
        assert!(Validator::InterceptionMode.validate("NONE").is_err());
    }

    #[test]
    fn cidr_list_accepts_empty_and_valid_entries() {
        assert!(validate_cidr_list("").is_ok());
        assert!(validate_cidr_list("10.0.0.0/8").is_ok());
        assert!(validate_cidr_list("10.0.0.0/8,172.16.0.0/12,fd00::/8").is_ok());
    }

    #[test]
    fn cidr_list_accepts_host_bits() {
        assert!(validate_cidr_list("10.1.2.3/8").is_ok());
    }

    #[test]
    fn cidr_list_identifies_offending_entry() {
        let err = validate_cidr_list("10.0.0.0/8,bad-cidr").unwrap_err();
        assert_eq!(err.offending_entry(), "bad-cidr");
        assert!(err.to_string().contains("bad-cidr"));
    }

    #[test]
    fn cidr_list_rejects_bare_address_and_padding() {
        assert!(validate_cidr_list("10.0.0.1").is_err());
        assert!(validate_cidr_list("10.0.0.0/8, 192.168.0.0/16").is_err());
        assert!(validate_cidr_list("10.0.0.0/8,").is_err());
        assert!(validate_cidr_list("10.0.0.0/33").is_err());
    }

    #[test]
    fn wildcard_only_for_wildcard_variants() {
        assert!(Validator::CidrListWithWildcard.validate("*").is_ok());
        assert!(Validator::PortListWithWildcard.validate("*").is_ok());

        let err = Validator::CidrList.validate("*").unwrap_err();
        assert_eq!(err.offending_entry(), "*");
        let err = Validator::PortList.validate("*").unwrap_err();
        assert_eq!(err.offending_entry(), "*");
    }

    #[test]
    fn wildcard_is_not_accepted_inside_a_list() {
        assert!(Validator::CidrListWithWildcard.validate("*,10.0.0.0/8").is_err());
        assert!(Validator::PortListWithWildcard.validate("80,*").is_err());
    }

    #[test]
    fn wildcard_variants_still_validate_entries() {
        assert!(Validator::CidrListWithWildcard.validate("10.0.0.0/8").is_ok());
        assert!(Validator::CidrListWithWildcard.validate("nope").is_err());
        assert!(Validator::PortListWithWildcard.validate("80,443").is_ok());
        assert!(Validator::PortListWithWildcard.validate("http").is_err());
    }

    #[test]
    fn parse_ports_trims_whitespace() {
        assert_eq!(parse_ports(" 80 , 443 ").unwrap(), vec![80, 443]);
        assert_eq!(parse_ports("   ").unwrap(), Vec::<u16>::new());
    }

    #[test]
    fn parse_ports_boundaries() {
        assert_eq!(parse_ports("0,65535").unwrap(), vec![0, 65535]);
        let err = parse_ports("65536").unwrap_err();
        assert_eq!(err.offending_entry(), "65536");
    }

    #[test]
    fn parse_ports_rejects_out_of_range() {
        let err = parse_ports("70000").unwrap_err();
        assert!(matches!(err, ValueError::Port { ref entry, .. } if entry == "70000"));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn parse_ports_rejects_sign_and_garbage() {
        assert!(parse_ports("+80").is_err());
        assert!(parse_ports("-1").is_err());
        assert!(parse_ports("80,,443").is_err());
        assert!(parse_ports("0x50").is_err());
    }

    #[test]
    fn always_valid_accepts_anything() {
        for value in ["", "*", "net1,net2", "ünïcode", "REDIRECT"] {
            assert!(Validator::AlwaysValid.validate(value).is_ok());
        }
    }

    #[test]
    fn accepts_wildcard_flag() {
        assert!(Validator::CidrListWithWildcard.accepts_wildcard());
        assert!(Validator::PortListWithWildcard.accepts_wildcard());
        assert!(!Validator::CidrList.accepts_wildcard());
        assert!(!Validator::PortList.accepts_wildcard());
        assert!(!Validator::InterceptionMode.accepts_wildcard());
        assert!(!Validator::AlwaysValid.accepts_wildcard());
    }

    #[test]
    fn validator_display_uses_name() {
        assert_eq!(Validator::PortListWithWildcard.to_string(), "port_list_with_wildcard");
    }
}
