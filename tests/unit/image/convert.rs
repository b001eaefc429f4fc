use super::*;

struct TestRow {
    planes: Vec<(Channel, Vec<f32>)>,
}

impl PlanarRow for TestRow {
    fn offset(&self) -> i32 {
        0
    }

    fn right(&self) -> i32 {
        self.planes.first().map(|(_, p)| p.len() as i32).unwrap_or(0)
    }

    fn plane(&self, channel: Channel) -> Option<&[f32]> {
        self.planes
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, p)| p.as_slice())
    }

    fn compute_channel(&mut self, channel: Channel) {
        let n = self.right() as usize;
        self.planes.push((channel, vec![0.0; n]));
    }
}

#[test]
fn packs_n_pixels_in_declared_order() {
    let r = [0.1f32, 0.2, 0.3];
    let g = [1.1f32, 1.2, 1.3];
    let b = [2.1f32, 2.2, 2.3];
    let a = [3.1f32, 3.2, 3.3];
    let planes = ChannelPlanes::new([&r, &g, &b, &a]);
    let mut dst = vec![-1.0f32; 12];
    pack_planes(&planes, 3, &mut dst);
    assert_eq!(
        dst,
        vec![0.1, 1.1, 2.1, 3.1, 0.2, 1.2, 2.2, 3.2, 0.3, 1.3, 2.3, 3.3]
    );
    assert_eq!(PACKED_ORDER[3], Channel::Alpha);
}

#[test]
fn leaves_components_past_count_untouched() {
    let p = [5.0f32; 4];
    let planes = ChannelPlanes::new([&p, &p, &p, &p]);
    let mut dst = vec![0.0f32; 16];
    pack_planes(&planes.slice(1, 2), 2, &mut dst);
    assert!(dst[..8].iter().all(|&v| v == 5.0));
    assert!(dst[8..].iter().all(|&v| v == 0.0));
}

#[test]
fn missing_plane_is_reported_before_conversion() {
    let mut row = TestRow {
        planes: vec![
            (Channel::Red, vec![1.0; 2]),
            (Channel::Green, vec![1.0; 2]),
            (Channel::Alpha, vec![1.0; 2]),
        ],
    };
    assert_eq!(
        ChannelPlanes::from_row(&row).map(|p| p.len()),
        Err(Channel::Blue)
    );
    row.compute_channel(Channel::Blue);
    assert_eq!(ChannelPlanes::from_row(&row).map(|p| p.len()), Ok(2));
}

#[test]
#[should_panic(expected = "channel planes hold")]
fn short_plane_is_a_contract_violation() {
    let full = [0.0f32; 4];
    let short = [0.0f32; 2];
    let planes = ChannelPlanes::new([&full, &full, &short, &full]);
    let mut dst = vec![0.0f32; 16];
    pack_planes(&planes, 4, &mut dst);
}
