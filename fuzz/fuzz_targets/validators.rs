#![no_main]

use libfuzzer_sys::fuzz_target;
use meshcni_redirect::validate::{parse_ports, validate_cidr_list};
use meshcni_redirect::Validator;

const ALL_VALIDATORS: [Validator; 6] = [
    Validator::AlwaysValid,
    Validator::InterceptionMode,
    Validator::CidrList,
    Validator::CidrListWithWildcard,
    Validator::PortList,
    Validator::PortListWithWildcard,
];

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = std::str::from_utf8(data) {
        for validator in ALL_VALIDATORS {
            if let Err(e) = validator.validate(value) {
                // 에러 항목은 항상 입력의 일부
                assert!(value.contains(e.offending_entry()));
            }
        }

        // 와일드카드 변형은 기본 검증기보다 엄격할 수 없음
        if Validator::CidrList.validate(value).is_ok() {
            assert!(Validator::CidrListWithWildcard.validate(value).is_ok());
        }
        if let Ok(ports) = parse_ports(value) {
            assert!(Validator::PortListWithWildcard.validate(value).is_ok());
            assert!(ports.len() <= value.len());
        }
        let _ = validate_cidr_list(value);
    }
});
