/// Availability of a region's analysis pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionStatus {
    Available,
    ComingSoon,
}

/// One river system or coastline covered by the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub slug: &'static str,
    pub title: &'static str,
    pub status: RegionStatus,
}

pub const REGIONS: &[Region] = &[
    Region {
        slug: "ballard-locks",
        title: "Ballard Locks",
        status: RegionStatus::ComingSoon,
    },
    Region {
        slug: "columbia-river",
        title: "Columbia River",
        status: RegionStatus::Available,
    },
    Region {
        slug: "fraser-river",
        title: "Fraser River",
        status: RegionStatus::ComingSoon,
    },
    Region {
        slug: "sacramento-river",
        title: "Sacramento River",
        status: RegionStatus::ComingSoon,
    },
    Region {
        slug: "coastal-british-columbia",
        title: "Coastal British Columbia",
        status: RegionStatus::ComingSoon,
    },
    Region {
        slug: "coastal-oregon",
        title: "Coastal Oregon",
        status: RegionStatus::ComingSoon,
    },
    Region {
        slug: "coastal-washington",
        title: "Coastal Washington",
        status: RegionStatus::ComingSoon,
    },
];

pub const DEFAULT_REGION: &str = "columbia-river";

/// Look up a region by slug or title, case-insensitively.
pub fn find(name: &str) -> Option<&'static Region> {
    let n = name.trim();
    REGIONS
        .iter()
        .find(|r| r.slug.eq_ignore_ascii_case(n) || r.title.eq_ignore_ascii_case(n))
}

impl Region {
    pub fn is_available(&self) -> bool {
        self.status == RegionStatus::Available
    }
}
