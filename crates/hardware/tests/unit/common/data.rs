//! Memory Command Tests.

use dtusim_core::common::MemCmd;
use rstest::rstest;

#[rstest]
#[case(MemCmd::ReadReq, MemCmd::ReadResp)]
#[case(MemCmd::WriteReq, MemCmd::WriteResp)]
#[case(MemCmd::ReadResp, MemCmd::ReadResp)]
#[case(MemCmd::WriteResp, MemCmd::WriteResp)]
fn response_keeps_direction(#[case] req: MemCmd, #[case] resp: MemCmd) {
    assert_eq!(req.response(), resp);
    assert!(resp.is_response());
    assert_eq!(req.is_read(), resp.is_read());
}
