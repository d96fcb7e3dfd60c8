//! 실행 인자 렌더링
//!
//! [`RedirectConfig`]를 네임스페이스 진입 도구의 인자 목록으로 변환합니다.
//! 인자 순서는 고정이며 검증은 하지 않습니다.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use meshcni_core::config::RedirectSettings;

use crate::redirect::RedirectConfig;

/// 기본 네임스페이스 진입 프로그램
pub const DEFAULT_NSENTER: &str = "nsenter";
/// 기본 리다이렉트 설정 도구 디렉토리
pub const DEFAULT_SETUP_BIN_DIR: &str = "/opt/cni/bin";
/// 기본 리다이렉트 설정 도구 이름
pub const DEFAULT_SETUP_PROG: &str = "istio-iptables.sh";

/// 외부 도구 위치
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolPaths {
    /// 네임스페이스 진입 프로그램
    pub nsenter: String,
    /// 리다이렉트 설정 도구 디렉토리
    pub setup_bin_dir: PathBuf,
    /// 리다이렉트 설정 도구 이름
    pub setup_prog: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            nsenter: DEFAULT_NSENTER.to_owned(),
            setup_bin_dir: PathBuf::from(DEFAULT_SETUP_BIN_DIR),
            setup_prog: DEFAULT_SETUP_PROG.to_owned(),
        }
    }
}

impl ToolPaths {
    /// 설정 파일의 `[redirect]` 섹션에서 도구 위치를 가져옵니다.
    pub fn from_settings(settings: &RedirectSettings) -> Self {
        Self {
            nsenter: settings.nsenter_path.clone(),
            setup_bin_dir: PathBuf::from(&settings.setup_bin_dir),
            setup_prog: settings.setup_prog.clone(),
        }
    }

    /// 리다이렉트 설정 도구의 전체 경로
    pub fn setup_executable(&self) -> PathBuf {
        self.setup_bin_dir.join(&self.setup_prog)
    }
}

/// 렌더링된 외부 도구 호출
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectInvocation {
    /// 실행할 프로그램
    pub program: String,
    /// 인자 목록
    pub args: Vec<String>,
}

impl fmt::Display for RedirectInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            // 빈 값은 위치가 드러나도록 따옴표로 표시
            if arg.is_empty() {
                f.write_str(" ''")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// 구성을 외부 도구 호출로 렌더링합니다.
///
/// ```text
/// nsenter --net=<netns> <bin-dir>/<prog>
///     -p <target> -u <uid> -m <mode> -i <include-cidrs>
///     -b <include-ports> -d <exclude-ports> -x <exclude-cidrs> -k <kubevirt>
/// ```
pub fn render(config: &RedirectConfig, netns: &str, tools: &ToolPaths) -> RedirectInvocation {
    let flags = [
        ("-p", config.target_port()),
        ("-u", config.no_redirect_uid()),
        ("-m", config.redirect_mode()),
        ("-i", config.include_ip_cidrs()),
        ("-b", config.include_ports()),
        ("-d", config.exclude_ports()),
        ("-x", config.exclude_ip_cidrs()),
        ("-k", config.kubevirt_interfaces()),
    ];

    let mut args = Vec::with_capacity(2 + flags.len() * 2);
    args.push(format!("--net={netns}"));
    args.push(tools.setup_executable().to_string_lossy().into_owned());
    for (flag, value) in flags {
        args.push(flag.to_owned());
        args.push(value.to_owned());
    }

    RedirectInvocation {
        program: tools.nsenter.clone(),
        args,
    }
}
