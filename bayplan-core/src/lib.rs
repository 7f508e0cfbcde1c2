pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示。荷台坐标系原点位于左上角，y 轴沿荷台长度方向向下。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn distance(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }

        /// 所有坐标分量乘以同一系数，用于显示单位之间的换算。
        #[inline]
        pub fn scale(self, factor: f64) -> Self {
            Self(self.0 * factor)
        }
    }

    /// 二维向量。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        /// 以弧度角构造单位向量。
        #[inline]
        pub fn from_angle(angle: f64) -> Self {
            Self(DVec2::new(angle.cos(), angle.sin()))
        }

        #[inline]
        pub fn length(self) -> f64 {
            self.0.length()
        }

        #[inline]
        pub fn scale(self, factor: f64) -> Self {
            Self(self.0 * factor)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    /// 轴对齐矩形，描述以显示单位表示的荷台可放置区域。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        /// 以原点为左上角、给定宽度与长度构造矩形。
        #[inline]
        pub fn from_size(width: f64, length: f64) -> Self {
            Self::new(Point2::new(0.0, 0.0), Point2::new(width, length))
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.max.x() - self.min.x()
        }

        #[inline]
        pub fn length(&self) -> f64 {
            self.max.y() - self.min.y()
        }

        /// 点严格位于矩形内部（边界上不算）。
        #[inline]
        pub fn contains_strict(&self, point: Point2) -> bool {
            point.x() > self.min.x()
                && point.x() < self.max.x()
                && point.y() > self.min.y()
                && point.y() < self.max.y()
        }
    }
}

pub mod bay {
    use serde::{Deserialize, Serialize};

    /// 荷台固定宽度（毫米）。
    pub const BAY_WIDTH_MM: u32 = 2400;
    pub const MIN_BAY_LENGTH_MM: u32 = 5000;
    pub const MAX_BAY_LENGTH_MM: u32 = 15000;

    /// 荷台长度的合法区间（闭区间）。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LengthLimits {
        pub min_mm: u32,
        pub max_mm: u32,
    }

    impl LengthLimits {
        #[inline]
        pub fn new(min_mm: u32, max_mm: u32) -> Self {
            Self { min_mm, max_mm }
        }

        #[inline]
        pub fn contains(&self, length_mm: i64) -> bool {
            length_mm >= i64::from(self.min_mm) && length_mm <= i64::from(self.max_mm)
        }
    }

    impl Default for LengthLimits {
        fn default() -> Self {
            Self::new(MIN_BAY_LENGTH_MM, MAX_BAY_LENGTH_MM)
        }
    }

    /// 荷台模型：宽度固定，长度在会话开始时设定。长度为 0 表示尚未配置，此时不允许放置。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Bay {
        width_mm: u32,
        length_mm: u32,
    }

    impl Bay {
        #[inline]
        pub fn new(width_mm: u32, length_mm: u32) -> Self {
            Self {
                width_mm,
                length_mm,
            }
        }

        /// 未配置长度的荷台。
        #[inline]
        pub fn unconfigured(width_mm: u32) -> Self {
            Self::new(width_mm, 0)
        }

        #[inline]
        pub fn width_mm(&self) -> u32 {
            self.width_mm
        }

        #[inline]
        pub fn length_mm(&self) -> u32 {
            self.length_mm
        }

        #[inline]
        pub fn is_configured(&self) -> bool {
            self.length_mm > 0
        }

        #[inline]
        pub fn set_length_mm(&mut self, length_mm: u32) {
            self.length_mm = length_mm;
        }

        /// 每隔 `interval_mm` 的内部参考线位置（毫米），不含两端。
        pub fn guide_positions_mm(&self, interval_mm: u32) -> Vec<u32> {
            if interval_mm == 0 || !self.is_configured() {
                return Vec::new();
            }
            (1..)
                .map(|step| step * interval_mm)
                .take_while(|mm| *mm < self.length_mm)
                .collect()
        }
    }

    impl Default for Bay {
        fn default() -> Self {
            Self::unconfigured(BAY_WIDTH_MM)
        }
    }
}

pub mod catalog {
    use std::collections::HashMap;
    use std::fmt;

    use serde::{Deserialize, Serialize};

    pub const CATALOG_CODE_WIDTH: usize = 4;

    /// 品番，统一左侧补零至 4 位。超过 4 位的输入保持原样。
    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct CatalogCode(String);

    impl CatalogCode {
        /// 去除首尾空白并补零；空输入返回 `None`。
        pub fn parse(raw: &str) -> Option<Self> {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }
            Some(Self(format!("{trimmed:0>width$}", width = CATALOG_CODE_WIDTH)))
        }

        #[inline]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl fmt::Display for CatalogCode {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    /// 目录中的一条产品记录。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct CatalogEntry {
        pub code: CatalogCode,
        pub size: String,
        pub diameter_mm: u32,
        pub width_mm: u32,
        pub pallet_count: Option<u32>,
        pub note: String,
    }

    /// 外部目录的只读查询接口。
    pub trait CatalogProvider {
        fn lookup(&self, code: &CatalogCode) -> Option<&CatalogEntry>;
        fn len(&self) -> usize;

        fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    /// 以哈希表保存的目录，供 CSV 加载结果与测试使用。
    #[derive(Debug, Clone, Default)]
    pub struct InMemoryCatalog {
        entries: HashMap<CatalogCode, CatalogEntry>,
    }

    impl InMemoryCatalog {
        pub fn new() -> Self {
            Self::default()
        }

        /// 插入记录，同一品番后写覆盖先写。
        pub fn insert(&mut self, entry: CatalogEntry) {
            self.entries.insert(entry.code.clone(), entry);
        }
    }

    impl FromIterator<CatalogEntry> for InMemoryCatalog {
        fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
            let mut catalog = Self::new();
            for entry in iter {
                catalog.insert(entry);
            }
            catalog
        }
    }

    impl CatalogProvider for InMemoryCatalog {
        fn lookup(&self, code: &CatalogCode) -> Option<&CatalogEntry> {
            self.entries.get(code)
        }

        fn len(&self) -> usize {
            self.entries.len()
        }
    }
}

pub mod tire {
    use std::fmt;

    use serde::{Deserialize, Serialize};

    use crate::catalog::CatalogCode;
    use crate::geometry::Point2;

    const ID_PREFIX: &str = "tire-";

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct TireId(u64);

    impl TireId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 原始数值，便于序列化或日志输出。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }

        /// 解析 `tire-<n>` 形式的标签。
        pub fn parse_label(label: &str) -> Option<Self> {
            label
                .strip_prefix(ID_PREFIX)
                .and_then(|digits| digits.parse::<u64>().ok())
                .map(Self)
        }
    }

    impl fmt::Display for TireId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{ID_PREFIX}{}", self.0)
        }
    }

    /// 单调递增的 ID 分配器，记录最后一次分配的值。
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct TireIdAllocator {
        last: u64,
    }

    impl TireIdAllocator {
        #[inline]
        pub fn new() -> Self {
            Self::default()
        }

        #[inline]
        pub fn next_id(&mut self) -> TireId {
            self.last += 1;
            TireId(self.last)
        }

        #[inline]
        pub fn last(&self) -> u64 {
            self.last
        }

        #[inline]
        pub fn reset_to(&mut self, last: u64) {
            self.last = last;
        }
    }

    /// 已放置或悬空的轮胎。`diameter_mm` 创建后不可变，显示单位下的直径随缩放重新计算。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Tire {
        id: TireId,
        diameter_mm: f64,
        diameter: f64,
        pub position: Point2,
        pub in_bay: bool,
        pub catalog_code: Option<CatalogCode>,
    }

    impl Tire {
        pub fn new(
            id: TireId,
            diameter_mm: f64,
            diameter: f64,
            position: Point2,
            catalog_code: Option<CatalogCode>,
        ) -> Self {
            Self {
                id,
                diameter_mm,
                diameter,
                position,
                in_bay: true,
                catalog_code,
            }
        }

        #[inline]
        pub fn id(&self) -> TireId {
            self.id
        }

        #[inline]
        pub fn diameter_mm(&self) -> f64 {
            self.diameter_mm
        }

        /// 显示单位下的直径。
        #[inline]
        pub fn diameter(&self) -> f64 {
            self.diameter
        }

        #[inline]
        pub fn radius(&self) -> f64 {
            self.diameter / 2.0
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            let r = self.radius();
            Point2::new(self.position.x() + r, self.position.y() + r)
        }

        /// 包围盒下边缘（显示单位）。
        #[inline]
        pub fn bottom(&self) -> f64 {
            self.position.y() + self.diameter
        }

        /// 以新的显示直径替换旧值，物理直径保持不变。
        #[inline]
        pub fn set_display_diameter(&mut self, diameter: f64) {
            self.diameter = diameter;
        }
    }
}

pub mod snapshot {
    use serde::{Deserialize, Serialize};

    use crate::catalog::CatalogCode;
    use crate::tire::{Tire, TireId};

    /// 快照中的单条轮胎记录，坐标为捕获时的显示单位。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct TireRecord {
        pub id: TireId,
        pub x: f64,
        pub y: f64,
        pub diameter_mm: f64,
        pub catalog_code: Option<CatalogCode>,
        pub in_bay: bool,
    }

    impl From<&Tire> for TireRecord {
        fn from(tire: &Tire) -> Self {
            Self {
                id: tire.id(),
                x: tire.position.x(),
                y: tire.position.y(),
                diameter_mm: tire.diameter_mm(),
                catalog_code: tire.catalog_code.clone(),
                in_bay: tire.in_bay,
            }
        }
    }

    /// 完整布局的不可变快照，按插入顺序保存轮胎。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Snapshot {
        tires: Vec<TireRecord>,
        bay_length_mm: u32,
        id_counter: u64,
        scale_factor: f64,
    }

    impl Snapshot {
        pub fn new(
            tires: Vec<TireRecord>,
            bay_length_mm: u32,
            id_counter: u64,
            scale_factor: f64,
        ) -> Self {
            Self {
                tires,
                bay_length_mm,
                id_counter,
                scale_factor,
            }
        }

        /// 深拷贝当前布局。
        pub fn capture<'a>(
            tires: impl IntoIterator<Item = &'a Tire>,
            bay_length_mm: u32,
            id_counter: u64,
            scale_factor: f64,
        ) -> Self {
            Self::new(
                tires.into_iter().map(TireRecord::from).collect(),
                bay_length_mm,
                id_counter,
                scale_factor,
            )
        }

        #[inline]
        pub fn tires(&self) -> &[TireRecord] {
            &self.tires
        }

        #[inline]
        pub fn bay_length_mm(&self) -> u32 {
            self.bay_length_mm
        }

        #[inline]
        pub fn id_counter(&self) -> u64 {
            self.id_counter
        }

        /// 捕获时的缩放系数（毫米 / 显示单位）。
        #[inline]
        pub fn scale_factor(&self) -> f64 {
            self.scale_factor
        }

        /// 快照中出现的最大 ID，空快照为 0。
        pub fn max_tire_id(&self) -> u64 {
            self.tires.iter().map(|t| t.id.get()).max().unwrap_or(0)
        }
    }
}
