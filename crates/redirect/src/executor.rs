//! 리다이렉트 실행기 -- 렌더링된 호출을 외부 도구로 실행
//!
//! [`RedirectExecutor`]는 구성을 렌더링하여 [`CommandRunner`]에 넘기고 결과를 보고합니다.
//! 실행은 호출마다 정확히 한 번이며 재시도와 타임아웃은 없습니다.
//! 비정상 종료는 항상 호출측에 에러로 전파됩니다.

use std::sync::Arc;

use metrics::counter;
use tracing::{error, info};

use meshcni_core::metrics as m;

use crate::error::RedirectError;
use crate::redirect::RedirectConfig;
use crate::render::{RedirectInvocation, ToolPaths, render};
use crate::runner::{CommandOutput, CommandRunner};

/// 리다이렉트 실행기
pub struct RedirectExecutor<R: CommandRunner> {
    /// 외부 명령 실행기
    runner: Arc<R>,
    /// 외부 도구 위치
    tools: ToolPaths,
}

impl<R: CommandRunner> RedirectExecutor<R> {
    /// 새 실행기를 생성합니다.
    pub fn new(runner: Arc<R>, tools: ToolPaths) -> Self {
        Self { runner, tools }
    }

    /// 실행기가 사용하는 도구 위치
    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    /// 실행하지 않고 호출만 렌더링합니다.
    pub fn plan(&self, config: &RedirectConfig, netns: &str) -> RedirectInvocation {
        render(config, netns, &self.tools)
    }

    /// 워크로드의 네트워크 네임스페이스에 리다이렉트를 설정합니다.
    ///
    /// # Errors
    ///
    /// - `RedirectError::Spawn`: 도구를 시작할 수 없음
    /// - `RedirectError::InvocationFailed`: 도구가 실패 상태로 종료
    pub async fn execute(
        &self,
        config: &RedirectConfig,
        netns: &str,
    ) -> Result<CommandOutput, RedirectError> {
        let invocation = self.plan(config, netns);
        info!(
            netns = netns,
            program = %invocation.program,
            args = ?invocation.args,
            "running redirect setup"
        );

        let output = match self.runner.run(&invocation).await {
            Ok(output) => output,
            Err(e) => {
                counter!(m::REDIRECT_INVOCATIONS_TOTAL, m::LABEL_RESULT => "failure").increment(1);
                counter!(m::REDIRECT_INVOCATION_FAILURES_TOTAL).increment(1);
                error!(netns = netns, error = %e, "failed to start redirect setup");
                return Err(e);
            }
        };

        if !output.success {
            counter!(m::REDIRECT_INVOCATIONS_TOTAL, m::LABEL_RESULT => "failure").increment(1);
            counter!(m::REDIRECT_INVOCATION_FAILURES_TOTAL).increment(1);
            error!(
                netns = netns,
                status = ?output.status,
                output = %output.output,
                "redirect setup failed"
            );
            return Err(RedirectError::InvocationFailed {
                netns: netns.to_owned(),
                status: output.status,
                output: output.output,
            });
        }

        counter!(m::REDIRECT_INVOCATIONS_TOTAL, m::LABEL_RESULT => "success").increment(1);
        info!(netns = netns, output = %output.output, "redirect setup completed");
        Ok(output)
    }
}
