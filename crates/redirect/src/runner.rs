//! 외부 프로세스 실행 추상화
//!
//! [`CommandRunner`] trait은 외부 도구 실행을 추상화하여 프로덕션에서는
//! [`ProcessCommandRunner`]를, 테스트에서는 `MockCommandRunner`를 사용할 수 있게 합니다.
//!
//! ```text
//! ┌──────────────────┐
//! │ RedirectExecutor │
//! └────────┬─────────┘
//!          │
//!          ▼
//!   ┌──────────────┐
//!   │CommandRunner │ (trait)
//!   └──────────────┘
//!        │     │
//!        ▼     ▼
//!   ┌───────┐ ┌────┐
//!   │Process│ │Mock│
//!   └───┬───┘ └────┘
//!       │
//!       ▼
//!   nsenter
//! ```

use std::future::Future;
use std::io::Read;
use std::process::Stdio;

use serde::Serialize;
use tokio::process::Command;

use crate::error::RedirectError;
use crate::render::RedirectInvocation;

/// 외부 도구 실행 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    /// 종료 코드 (시그널로 종료되면 None)
    pub status: Option<i32>,
    /// 성공 종료 여부
    pub success: bool,
    /// stdout과 stderr를 쓰인 순서대로 합친 출력
    pub output: String,
}

/// 외부 명령 실행 추상화
pub trait CommandRunner: Send + Sync + 'static {
    /// 호출을 한 번 실행하고 종료를 기다립니다.
    ///
    /// 비정상 종료는 에러가 아니라 `CommandOutput::success == false`로 보고합니다.
    ///
    /// # Errors
    ///
    /// - `RedirectError::Spawn`: 프로세스를 시작할 수 없음
    fn run(
        &self,
        invocation: &RedirectInvocation,
    ) -> impl Future<Output = Result<CommandOutput, RedirectError>> + Send;
}

/// `tokio::process` 기반 실행기
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessCommandRunner;

impl ProcessCommandRunner {
    /// 새 실행기를 생성합니다.
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessCommandRunner {
    async fn run(&self, invocation: &RedirectInvocation) -> Result<CommandOutput, RedirectError> {
        let spawn_error = |reason: String| RedirectError::Spawn {
            program: invocation.program.clone(),
            reason,
        };

        // stdout과 stderr가 같은 파이프를 공유해야 쓰인 순서가 유지됨
        let (mut reader, stdout) = std::io::pipe().map_err(|e| spawn_error(e.to_string()))?;
        let stderr = stdout
            .try_clone()
            .map_err(|e| spawn_error(e.to_string()))?;

        let mut child = {
            let mut command = Command::new(&invocation.program);
            command
                .args(&invocation.args)
                .stdin(Stdio::null())
                .stdout(stdout)
                .stderr(stderr)
                .kill_on_drop(true);
            command.spawn().map_err(|e| spawn_error(e.to_string()))?
        };

        let collector = tokio::task::spawn_blocking(move || {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf).map(|_| buf)
        });

        let status = child
            .wait()
            .await
            .map_err(|e| spawn_error(format!("failed to wait for process: {e}")))?;
        let output = collector
            .await
            .map_err(|e| spawn_error(format!("output collector failed: {e}")))?
            .map_err(|e| spawn_error(format!("failed to read output: {e}")))?;

        Ok(CommandOutput {
            status: status.code(),
            success: status.success(),
            output: String::from_utf8_lossy(&output).into_owned(),
        })
    }
}

/// 테스트용 Mock 실행기
///
/// 설정된 결과를 반환하고 받은 호출을 기록합니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockCommandRunner {
    /// 반환할 종료 코드
    pub exit_code: i32,
    /// 반환할 출력
    pub output: String,
    /// 프로세스 시작 실패를 시뮬레이션할지 여부
    pub fail_spawn: bool,
    /// 받은 호출 기록
    pub calls: std::sync::Mutex<Vec<RedirectInvocation>>,
}

#[cfg(test)]
impl MockCommandRunner {
    /// 성공하는 mock 실행기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 종료 코드와 출력을 설정합니다.
    pub fn with_exit(mut self, code: i32, output: &str) -> Self {
        self.exit_code = code;
        self.output = output.to_owned();
        self
    }

    /// 프로세스 시작이 실패하도록 설정합니다.
    pub fn with_spawn_failure(mut self) -> Self {
        self.fail_spawn = true;
        self
    }

    /// 받은 호출 수
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }
}

#[cfg(test)]
impl CommandRunner for MockCommandRunner {
    async fn run(&self, invocation: &RedirectInvocation) -> Result<CommandOutput, RedirectError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(invocation.clone());
        }
        if self.fail_spawn {
            return Err(RedirectError::Spawn {
                program: invocation.program.clone(),
                reason: "mock spawn failure".to_owned(),
            });
        }
        Ok(CommandOutput {
            status: Some(self.exit_code),
            success: self.exit_code == 0,
            output: self.output.clone(),
        })
    }
}
