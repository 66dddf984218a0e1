/// Disk-transfer puzzle: three pegs, disks numbered by size, largest at the bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tower {
    pegs: [Vec<u8>; 3],
    disks: u8,
    moves: u32,
}

impl Tower {
    /// All `disks` stacked on the first peg.
    pub fn new(disks: u8) -> Self {
        Self {
            pegs: [(1..=disks).rev().collect(), Vec::new(), Vec::new()],
            disks,
            moves: 0,
        }
    }

    pub fn optimal_moves(&self) -> u32 {
        (1u32 << self.disks) - 1
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn disks(&self) -> u8 {
        self.disks
    }

    pub fn peg(&self, index: usize) -> Option<&[u8]> {
        self.pegs.get(index).map(Vec::as_slice)
    }

    pub fn top(&self, index: usize) -> Option<u8> {
        self.pegs.get(index).and_then(|p| p.last().copied())
    }

    pub fn is_legal(&self, from: usize, to: usize) -> bool {
        if from == to || to >= self.pegs.len() {
            return false;
        }
        match (self.top(from), self.top(to)) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(moving), Some(under)) => moving < under,
        }
    }

    /// Moves the top disk of `from` onto `to`. Illegal moves change nothing and return `false`.
    pub fn move_disk(&mut self, from: usize, to: usize) -> bool {
        if !self.is_legal(from, to) {
            return false;
        }
        if let Some(disk) = self.pegs[from].pop() {
            self.pegs[to].push(disk);
            self.moves += 1;
            return true;
        }
        false
    }

    /// Solved once the last peg holds every disk, largest first.
    pub fn is_solved(&self) -> bool {
        let goal: Vec<u8> = (1..=self.disks).rev().collect();
        self.pegs[2] == goal
    }
}
