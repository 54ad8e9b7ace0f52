/// Rectangle packer.
///
/// Uses the Skyline Bottom-Left heuristic.
pub struct Packer {
    width: u32,
    height: u32,
    skyline: Vec<Segment>,
}

struct Segment {
    x: u32,
    y: u32,
}

impl Packer {
    pub fn new(width: u32, height: u32) -> Packer {
        let mut packer = Packer { width: 0, height: 0, skyline: Vec::default() };
        packer.reset(width, height);
        packer
    }

    pub fn reset(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;

        self.skyline.clear();
        self.skyline.push(Segment { x: 0, y: 0 });
    }

    pub fn pack(&mut self, width: u32, height: u32) -> Option<(u32, u32)> {
        let mut position = 0;
        let mut bottom = u32::max_value();

        // Search for the lowest point on the skyline that can fit `width`.
        for i in 0..self.skyline.len() {
            let right = self.skyline[i].x + width;
            if right > self.width {
                break
            }

            // Find the maximum height starting with segment `i` and spanning `width`.
            let top = self
                .skyline
                .iter()
                .skip(i)
                .take_while(|&&Segment { x, .. }| x < right)
                .map(|&Segment { y, .. }| y)
                .max()
                .unwrap_or(0);

            if top < bottom {
                position = i;
                bottom = top;
            }
        }
        if bottom == u32::max_value() || bottom + height > self.height {
            return None
        }

        // Place a new segment on top of the skyline. The remainder to the
        // right of it keeps the height of whichever segment covered it.
        let left = self.skyline[position].x;
        let right = left + width;
        let remainder_y =
            self.skyline[position..].iter().take_while(|s| s.x <= right).last().map(|s| s.y).unwrap_or(0);
        self.skyline.insert(position, Segment { x: left, y: bottom + height });
        self.skyline[position + 1].x = right;
        self.skyline[position + 1].y = remainder_y;

        // Remove old segments underneath the new segment.
        let rest = position + 2;
        let next = self.skyline.iter().position(|&Segment { x, .. }| x > right).unwrap_or_else(|| self.skyline.len());
        self.skyline.drain(rest..next);

        Some((left, bottom))
    }
}
