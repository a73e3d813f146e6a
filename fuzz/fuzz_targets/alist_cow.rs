#![no_main]
use arbitrary::{Arbitrary, Unstructured};
use hyperion_fuzz_utils::{CommandSequence, CowCommand, RunnerState};
use libfuzzer_sys::fuzz_target;
use std::fmt::{self, Debug, Formatter};

#[derive(Copy, Clone, PartialEq, Eq)]
struct UpperLetter(char);

impl Debug for UpperLetter {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'d> Arbitrary<'d> for UpperLetter {
    fn arbitrary(u: &mut Unstructured<'d>) -> arbitrary::Result<Self> {
        Ok(UpperLetter((b'A' + u.int_in_range(0_u8..=25)?) as char))
    }
}

fuzz_target!(|cmds: CommandSequence<CowCommand<UpperLetter>>| {
    let cmds = cmds.map(|cmd| cmd.map_item(|c| c.0));

    let mut runner: RunnerState<char> = RunnerState::init(cmds.limits);

    for c in &cmds.cmds {
        runner.run_cow_cmd(c);
    }
});
