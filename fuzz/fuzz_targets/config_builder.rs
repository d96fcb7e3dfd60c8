#![no_main]

use std::collections::HashMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use meshcni_redirect::{Field, RedirectConfigBuilder, RedirectError, ToolPaths, render};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 필드 인덱스와 값 (인덱스는 Field::ALL 범위로 정규화)
    annotations: Vec<(u8, String)>,
    container_ports: Vec<String>,
    proxy_uid: Option<i64>,
    netns: String,
}

fuzz_target!(|input: FuzzInput| {
    let annotations: HashMap<String, String> = input
        .annotations
        .into_iter()
        .take(16)
        .map(|(i, value)| {
            let field = Field::ALL[usize::from(i) % Field::ALL.len()];
            (field.annotation_key().to_owned(), value)
        })
        .collect();

    let mut builder = RedirectConfigBuilder::new()
        .container_ports(input.container_ports.clone())
        .annotations(annotations);
    if let Some(uid) = input.proxy_uid {
        builder = builder.proxy_uid(uid);
    }

    let config = match builder.build() {
        Ok(config) => config,
        Err(RedirectError::IncludePortsFallback { fallback, .. }) => {
            assert_eq!(fallback.include_ports(), input.container_ports.join(","));
            *fallback
        }
        Err(_) => return,
    };

    // 렌더링은 항상 고정 길이
    let invocation = render(&config, &input.netns, &ToolPaths::default());
    assert_eq!(invocation.args.len(), 18);
});
