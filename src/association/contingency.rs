/// 2x2 table of allele carriers inside and outside one cluster.
///
/// ```text
///              carrier        non-carrier
/// cluster   [ count_allele,  total_allele - count_allele ]
/// other     [ count_other,   total_other - count_other   ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwoByTwo {
    pub count_allele: u64,
    pub total_allele: u64,
    pub count_other: u64,
    pub total_other: u64,
}

impl TwoByTwo {
    pub fn new(count_allele: u64, total_allele: u64, count_other: u64, total_other: u64) -> Self {
        debug_assert!(count_allele <= total_allele);
        debug_assert!(count_other <= total_other);
        Self {
            count_allele,
            total_allele,
            count_other,
            total_other,
        }
    }

    pub fn cells(&self) -> [[u64; 2]; 2] {
        [
            [self.count_allele, self.total_allele - self.count_allele],
            [self.count_other, self.total_other - self.count_other],
        ]
    }

    /// Column total of carriers.
    pub fn carriers(&self) -> u64 {
        self.count_allele + self.count_other
    }

    pub fn total(&self) -> u64 {
        self.total_allele + self.total_other
    }
}
