#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use secure_stream::protocol::{drain_lines, take_remainder};

#[derive(Debug)]
struct ChunkedInput {
    data: Vec<u8>,
    split_points: Vec<u8>,
}

impl<'a> Arbitrary<'a> for ChunkedInput {
    fn arbitrary(u: &mut Unstructured<'a>) -> libfuzzer_sys::arbitrary::Result<Self> {
        let data: Vec<u8> = u.arbitrary()?;
        let split_points: Vec<u8> = u.arbitrary()?;
        Ok(Self { data, split_points })
    }
}

fuzz_target!(|input: ChunkedInput| {
    let mut splits: Vec<usize> = input
        .split_points
        .iter()
        .map(|&b| (b as usize) % (input.data.len() + 1))
        .collect();
    splits.push(0);
    splits.push(input.data.len());
    splits.sort_unstable();
    splits.dedup();

    // Feed the stream in chunks; the assembled response must not depend on
    // where the chunk boundaries fall
    let mut buf = BytesMut::new();
    let mut out = BytesMut::new();
    for window in splits.windows(2) {
        buf.extend_from_slice(&input.data[window[0]..window[1]]);
        drain_lines(&mut buf, &mut out);
        assert!(!buf.contains(&b'\n'));
    }
    if let Some(tail) = take_remainder(&mut buf) {
        out.extend_from_slice(&tail);
    }

    let expected: Vec<u8> = input.data.iter().copied().filter(|&b| b != b'\n').collect();
    assert_eq!(&out[..], &expected[..]);
});
