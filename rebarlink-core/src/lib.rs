pub mod geometry {
    use glam::{DAffine3, DMat3, DVec3};
    use serde::{Deserialize, Serialize};

    /// 三维点，内部以 `glam::DVec3` 表示，坐标统一为世界坐标系下的双精度值。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point3(pub DVec3);

    impl Point3 {
        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn from_vec(vec: DVec3) -> Self {
            Self(vec)
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
        pub fn z(self) -> f64 {
            self.0.z
        }

        #[inline]
        pub fn translate(self, offset: Vector3) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point3) -> Vector3 {
            Vector3(other.0 - self.0)
        }

        #[inline]
        pub fn is_finite(self) -> bool {
            self.0.is_finite()
        }

        #[inline]
        pub fn as_vec3(self) -> DVec3 {
            self.0
        }
    }

    impl From<DVec3> for Point3 {
        fn from(value: DVec3) -> Self {
            Self(value)
        }
    }

    /// 三维向量。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector3(pub DVec3);

    impl Vector3 {
        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn as_vec3(self) -> DVec3 {
            self.0
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        #[inline]
        pub fn normalize(self) -> Option<Self> {
            let len = self.0.length();
            if len <= f64::EPSILON || !len.is_finite() {
                None
            } else {
                Some(Self(self.0 / len))
            }
        }

        #[inline]
        pub fn dot(self, other: Vector3) -> f64 {
            self.0.dot(other.0)
        }

        #[inline]
        pub fn cross(self, other: Vector3) -> Vector3 {
            Self(self.0.cross(other.0))
        }
    }

    impl From<DVec3> for Vector3 {
        fn from(value: DVec3) -> Self {
            Self(value)
        }
    }

    /// 三维轴对齐边界框，用于包含性测试前的快速排除。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds3D {
        min: Point3,
        max: Point3,
    }

    impl Bounds3D {
        #[inline]
        pub fn new(min: Point3, max: Point3) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
                max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
            let mut bounds = Self::empty();
            for point in points {
                bounds.include_point(*point);
            }
            bounds
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y() || self.min.z() > self.max.z()
        }

        #[inline]
        pub fn min(&self) -> Point3 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point3 {
            self.max
        }

        pub fn include_point(&mut self, point: Point3) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            self.min = Point3::from_vec(self.min.as_vec3().min(point.as_vec3()));
            self.max = Point3::from_vec(self.max.as_vec3().max(point.as_vec3()));
        }

        /// 判断点是否落在（向外扩张 `margin` 后的）边界框内。
        pub fn contains_point(&self, point: Point3, margin: f64) -> bool {
            if self.is_empty() {
                return false;
            }
            let p = point.as_vec3();
            let min = self.min.as_vec3() - DVec3::splat(margin);
            let max = self.max.as_vec3() + DVec3::splat(margin);
            p.cmpge(min).all() && p.cmple(max).all()
        }

        pub fn intersects(&self, other: &Bounds3D, margin: f64) -> bool {
            if self.is_empty() || other.is_empty() {
                return false;
            }
            let a_min = self.min.as_vec3() - DVec3::splat(margin);
            let a_max = self.max.as_vec3() + DVec3::splat(margin);
            a_min.cmple(other.max.as_vec3()).all() && other.min.as_vec3().cmple(a_max).all()
        }
    }

    /// 局部坐标到世界坐标的放置矩阵（钢筋放置的 placement matrix）。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Placement(pub DAffine3);

    impl Placement {
        #[inline]
        pub fn identity() -> Self {
            Self(DAffine3::IDENTITY)
        }

        #[inline]
        pub fn from_translation(offset: Vector3) -> Self {
            Self(DAffine3::from_translation(offset.as_vec3()))
        }

        /// 由原点、X 轴与 Z 轴构造右手坐标系。X 轴会被投影到与 Z 轴正交的平面上；
        /// 任一轴退化或两轴平行时返回 `None`。
        pub fn from_axes(origin: Point3, x_axis: Vector3, z_axis: Vector3) -> Option<Self> {
            let z = z_axis.normalize()?;
            let x = x_axis.normalize()?;
            let x = Vector3(x.0 - z.0 * x.dot(z)).normalize()?;
            let y = z.cross(x).normalize()?;
            let basis = DMat3::from_cols(x.0, y.0, z.0);
            Some(Self(DAffine3::from_mat3_translation(basis, origin.as_vec3())))
        }

        #[inline]
        pub fn origin(&self) -> Point3 {
            Point3(self.0.translation)
        }

        #[inline]
        pub fn transform_point(&self, point: Point3) -> Point3 {
            Point3(self.0.transform_point3(point.as_vec3()))
        }

        #[inline]
        pub fn is_finite(&self) -> bool {
            self.0.is_finite()
        }
    }

    impl Default for Placement {
        fn default() -> Self {
            Self::identity()
        }
    }
}

pub mod solid {
    use std::sync::OnceLock;

    use glam::{DVec2, DVec3};
    use serde::{Deserialize, Serialize};

    use crate::geometry::{Bounds3D, Point3};

    /// 射线与面边缘/顶点的判退化距离。
    const DEGENERATE_TOLERANCE: f64 = 1e-9;

    /// 依次尝试的射线方向：先用不与坐标轴对齐的方向，避免命中常见的正交棱边。
    const RAY_DIRECTIONS: [DVec3; 6] = [
        DVec3::new(1.0, 0.271_828_182_8, 0.141_421_356_2),
        DVec3::new(0.173_205_080_7, 1.0, 0.314_159_265_3),
        DVec3::new(0.223_606_797_7, 0.161_803_398_8, 1.0),
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(0.0, 1.0, 0.0),
        DVec3::new(0.0, 0.0, 1.0),
    ];

    /// 点相对实体的位置。`Boundary` 不计为内部。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum PointPosition {
        Inside,
        Outside,
        Boundary,
    }

    /// 平面多边形面，顶点按环序排列，最后一个顶点隐式连回第一个。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Face {
        pub vertices: Vec<Point3>,
    }

    impl Face {
        #[inline]
        pub fn new(vertices: impl IntoIterator<Item = Point3>) -> Self {
            Self {
                vertices: vertices.into_iter().collect(),
            }
        }
    }

    /// 由平面多边形面围成的封闭边界表示，坐标已在世界坐标系下。
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct Solid {
        faces: Vec<Face>,
        /// 首次点查询时建立，面不可变因此之后一直有效。
        #[serde(skip)]
        index: OnceLock<SolidIndex>,
    }

    impl PartialEq for Solid {
        fn eq(&self, other: &Self) -> bool {
            self.faces == other.faces
        }
    }

    /// 点查询共用的包围盒与面平面。
    #[derive(Debug, Clone)]
    struct SolidIndex {
        bounds: Bounds3D,
        planes: Vec<FacePlane>,
    }

    impl Solid {
        pub fn from_faces(faces: impl IntoIterator<Item = Face>) -> Self {
            Self {
                faces: faces.into_iter().collect(),
                index: OnceLock::new(),
            }
        }

        /// 轴对齐长方体，`min`/`max` 为对角点。
        pub fn cuboid(min: Point3, max: Point3) -> Self {
            let (a, b) = (min.as_vec3().min(max.as_vec3()), min.as_vec3().max(max.as_vec3()));
            let base = [
                Point3::new(a.x, a.y, a.z),
                Point3::new(b.x, a.y, a.z),
                Point3::new(b.x, b.y, a.z),
                Point3::new(a.x, b.y, a.z),
            ];
            Self::extruded(&base, b.z - a.z)
        }

        /// 将水平多边形沿 +Z 拉伸 `height` 得到棱柱，适用于墙体、柱等截面构件。
        pub fn extruded(base: &[Point3], height: f64) -> Self {
            let top: Vec<Point3> = base
                .iter()
                .map(|p| Point3::new(p.x(), p.y(), p.z() + height))
                .collect();
            let mut faces = Vec::with_capacity(base.len() + 2);
            faces.push(Face::new(base.iter().rev().copied()));
            faces.push(Face::new(top.iter().copied()));
            let n = base.len();
            for i in 0..n {
                let j = (i + 1) % n;
                faces.push(Face::new([base[i], base[j], top[j], top[i]]));
            }
            Self::from_faces(faces)
        }

        #[inline]
        pub fn faces(&self) -> &[Face] {
            &self.faces
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.faces.is_empty()
        }

        pub fn bounds(&self) -> Bounds3D {
            self.index().bounds
        }

        fn index(&self) -> &SolidIndex {
            self.index.get_or_init(|| SolidIndex {
                bounds: Bounds3D::from_points(
                    self.faces.iter().flat_map(|face| face.vertices.iter()),
                ),
                planes: self.faces.iter().filter_map(FacePlane::new).collect(),
            })
        }

        /// 射线法判断点与实体的位置关系：奇数次穿越为内部，偶数次为外部。
        /// 距某个面不超过 `epsilon` 且落在面内的点视为边界点。
        /// 射线若擦过棱边/顶点则换方向重试，全部退化时按外部处理。
        pub fn position_of(&self, point: Point3, epsilon: f64) -> PointPosition {
            let epsilon = if epsilon.is_finite() { epsilon.max(0.0) } else { 0.0 };
            let index = self.index();
            if !point.is_finite() || !index.bounds.contains_point(point, epsilon) {
                return PointPosition::Outside;
            }

            let planes = &index.planes;
            let p = point.as_vec3();

            for plane in planes {
                if plane.signed_distance(p).abs() <= epsilon && plane.covers(p, epsilon) {
                    return PointPosition::Boundary;
                }
            }

            for direction in RAY_DIRECTIONS {
                if let RayCast::Clear(crossings) = cast_ray(p, direction, planes, epsilon) {
                    return if crossings % 2 == 1 {
                        PointPosition::Inside
                    } else {
                        PointPosition::Outside
                    };
                }
            }
            PointPosition::Outside
        }
    }

    enum RayCast {
        Clear(u32),
        Degenerate,
    }

    fn cast_ray(origin: DVec3, direction: DVec3, planes: &[FacePlane], epsilon: f64) -> RayCast {
        let mut crossings = 0u32;
        for plane in planes {
            let denom = plane.normal.dot(direction);
            let distance = plane.signed_distance(origin);
            if denom.abs() < 1e-12 {
                if distance.abs() <= epsilon.max(DEGENERATE_TOLERANCE) {
                    return RayCast::Degenerate;
                }
                continue;
            }
            let t = -distance / denom;
            if t <= epsilon {
                continue;
            }
            let hit = origin + direction * t;
            if plane.near_edge(hit, DEGENERATE_TOLERANCE) {
                return RayCast::Degenerate;
            }
            if plane.contains(hit) {
                crossings += 1;
            }
        }
        RayCast::Clear(crossings)
    }

    /// 面所在平面及其投影到二维后的多边形。
    #[derive(Debug, Clone)]
    struct FacePlane {
        normal: DVec3,
        offset: f64,
        drop_axis: usize,
        polygon: Vec<DVec2>,
    }

    impl FacePlane {
        fn new(face: &Face) -> Option<Self> {
            if face.vertices.len() < 3 {
                return None;
            }
            // Newell 法向量，对非凸多边形同样稳定。
            let mut normal = DVec3::ZERO;
            let n = face.vertices.len();
            for i in 0..n {
                let a = face.vertices[i].as_vec3();
                let b = face.vertices[(i + 1) % n].as_vec3();
                normal.x += (a.y - b.y) * (a.z + b.z);
                normal.y += (a.z - b.z) * (a.x + b.x);
                normal.z += (a.x - b.x) * (a.y + b.y);
            }
            let length = normal.length();
            if length < 1e-12 || !length.is_finite() {
                return None;
            }
            let normal = normal / length;
            let offset = normal.dot(face.vertices[0].as_vec3());
            let abs = normal.abs();
            let drop_axis = if abs.x >= abs.y && abs.x >= abs.z {
                0
            } else if abs.y >= abs.z {
                1
            } else {
                2
            };
            let polygon = face
                .vertices
                .iter()
                .map(|v| project(v.as_vec3(), drop_axis))
                .collect();
            Some(Self {
                normal,
                offset,
                drop_axis,
                polygon,
            })
        }

        #[inline]
        fn signed_distance(&self, point: DVec3) -> f64 {
            self.normal.dot(point) - self.offset
        }

        fn contains(&self, point: DVec3) -> bool {
            point_in_polygon(project(point, self.drop_axis), &self.polygon)
        }

        fn covers(&self, point: DVec3, epsilon: f64) -> bool {
            self.contains(point) || self.near_edge(point, epsilon.max(DEGENERATE_TOLERANCE))
        }

        fn near_edge(&self, point: DVec3, tolerance: f64) -> bool {
            let p = project(point, self.drop_axis);
            let n = self.polygon.len();
            (0..n).any(|i| {
                let a = self.polygon[i];
                let b = self.polygon[(i + 1) % n];
                distance_to_segment(p, a, b) <= tolerance
            })
        }
    }

    #[inline]
    fn project(point: DVec3, drop_axis: usize) -> DVec2 {
        match drop_axis {
            0 => DVec2::new(point.y, point.z),
            1 => DVec2::new(point.z, point.x),
            _ => DVec2::new(point.x, point.y),
        }
    }

    fn point_in_polygon(point: DVec2, polygon: &[DVec2]) -> bool {
        let mut inside = false;
        let n = polygon.len();
        let mut j = n.wrapping_sub(1);
        for i in 0..n {
            let a = polygon[i];
            let b = polygon[j];
            if (a.y > point.y) != (b.y > point.y) {
                let x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
                if point.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    fn distance_to_segment(point: DVec2, a: DVec2, b: DVec2) -> f64 {
        let ab = b - a;
        let len_sq = ab.length_squared();
        if len_sq < f64::EPSILON * f64::EPSILON {
            return point.distance(a);
        }
        let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
        point.distance(a + ab * t)
    }

}

pub mod attribute {
    use std::fmt;

    use serde::{Deserialize, Serialize};

    /// 宿主定义的数值型属性标识。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct AttributeId(i32);

    impl AttributeId {
        #[inline]
        pub const fn new(raw: i32) -> Self {
            Self(raw)
        }

        #[inline]
        pub fn get(self) -> i32 {
            self.0
        }
    }

    impl fmt::Display for AttributeId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum AttributeKind {
        Text,
        Float,
        Integer,
    }

    /// 属性值。反序列化时按 文本 → 整数 → 浮点 的顺序匹配。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum AttributeValue {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    impl AttributeValue {
        #[inline]
        pub fn kind(&self) -> AttributeKind {
            match self {
                AttributeValue::Text(_) => AttributeKind::Text,
                AttributeValue::Integer(_) => AttributeKind::Integer,
                AttributeValue::Float(_) => AttributeKind::Float,
            }
        }

        #[inline]
        pub fn as_text(&self) -> Option<&str> {
            match self {
                AttributeValue::Text(text) => Some(text),
                _ => None,
            }
        }

        /// 将值解释为目标类型，无法无损解释时返回 `None`。
        /// 浮点转整数时截断小数部分；文本按去除首尾空白后解析。
        pub fn convert(&self, kind: AttributeKind) -> Option<AttributeValue> {
            match (kind, self) {
                (AttributeKind::Text, value) => Some(AttributeValue::Text(value.to_string())),
                (AttributeKind::Float, AttributeValue::Float(v)) => Some(AttributeValue::Float(*v)),
                (AttributeKind::Float, AttributeValue::Integer(v)) => {
                    Some(AttributeValue::Float(*v as f64))
                }
                (AttributeKind::Float, AttributeValue::Text(text)) => {
                    text.trim().parse::<f64>().ok().map(AttributeValue::Float)
                }
                (AttributeKind::Integer, AttributeValue::Integer(v)) => {
                    Some(AttributeValue::Integer(*v))
                }
                (AttributeKind::Integer, AttributeValue::Float(v)) => {
                    if v.is_finite() && *v >= i64::MIN as f64 && *v < i64::MAX as f64 {
                        Some(AttributeValue::Integer(v.trunc() as i64))
                    } else {
                        None
                    }
                }
                (AttributeKind::Integer, AttributeValue::Text(text)) => {
                    text.trim().parse::<i64>().ok().map(AttributeValue::Integer)
                }
            }
        }
    }

    impl fmt::Display for AttributeValue {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                AttributeValue::Text(text) => f.write_str(text),
                AttributeValue::Integer(v) => write!(f, "{v}"),
                AttributeValue::Float(v) => write!(f, "{v}"),
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct AttributeRecord {
        pub id: AttributeId,
        pub value: AttributeValue,
    }

    impl AttributeRecord {
        #[inline]
        pub fn new(id: AttributeId, value: AttributeValue) -> Self {
            Self { id, value }
        }

        #[inline]
        pub fn text(id: i32, value: impl Into<String>) -> Self {
            Self::new(AttributeId::new(id), AttributeValue::Text(value.into()))
        }

        #[inline]
        pub fn integer(id: i32, value: i64) -> Self {
            Self::new(AttributeId::new(id), AttributeValue::Integer(value))
        }

        #[inline]
        pub fn float(id: i32, value: f64) -> Self {
            Self::new(AttributeId::new(id), AttributeValue::Float(value))
        }
    }

    /// 单个元素的属性集合，同一 `id` 至多一条记录，保持插入顺序。
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct AttributeSet {
        records: Vec<AttributeRecord>,
    }

    impl AttributeSet {
        #[inline]
        pub fn new() -> Self {
            Self::default()
        }

        #[inline]
        pub fn get(&self, id: AttributeId) -> Option<&AttributeRecord> {
            self.records.iter().find(|record| record.id == id)
        }

        #[inline]
        pub fn contains(&self, id: AttributeId) -> bool {
            self.get(id).is_some()
        }

        /// 写入一条记录：已有相同 `id` 时只替换值。
        pub fn set(&mut self, record: AttributeRecord) {
            match self.records.iter_mut().find(|existing| existing.id == record.id) {
                Some(existing) => existing.value = record.value,
                None => self.records.push(record),
            }
        }

        #[inline]
        pub fn iter(&self) -> impl Iterator<Item = &AttributeRecord> {
            self.records.iter()
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.records.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.records.is_empty()
        }
    }

    impl FromIterator<AttributeRecord> for AttributeSet {
        fn from_iter<T: IntoIterator<Item = AttributeRecord>>(iter: T) -> Self {
            let mut set = AttributeSet::new();
            for record in iter {
                set.set(record);
            }
            set
        }
    }
}

pub mod document {
    use std::collections::HashMap;

    use serde::{Deserialize, Serialize};

    use crate::attribute::{AttributeId, AttributeKind, AttributeRecord, AttributeSet};
    use crate::geometry::{Placement, Point3};
    use crate::solid::Solid;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ElementId(u64);

    impl ElementId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 提供原始数值，便于序列化或日志输出。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    /// 宿主元素的类型标签，序列化时使用变体名（如 `"BarsLinearPlacement"`）。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum ElementType {
        Slab,
        Column,
        Beam,
        WallTier,
        Volume3D,
        BRep3DVolume,
        Cylinder3D,
        Sphere3D,
        BarsLinearPlacement,
        BarsLinearMultiPlacement,
        BarsAreaPlacement,
        BarsSpiralPlacement,
        BarsCircularPlacement,
        BarsRotationalSolidPlacement,
        BarsRotationalPlacement,
        BarsTangentialPlacement,
        BarsEndBendingPlacement,
        Line3D,
        Text,
        Other,
    }

    /// 钢筋弯曲形状：局部坐标下的折线与放置矩阵。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct BarShape {
        pub local_outline: Vec<Point3>,
        pub placement: Placement,
    }

    /// 钢筋放置信息。`shape` 为 `None` 表示宿主无法解析该弯曲形状。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct BarPlacement {
        pub mark: String,
        pub shape: Option<BarShape>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct DrawingElement {
        pub element_type: ElementType,
        #[serde(default)]
        pub attributes: AttributeSet,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub solid: Option<Solid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub bar: Option<BarPlacement>,
    }

    impl DrawingElement {
        pub fn new(element_type: ElementType) -> Self {
            Self {
                element_type,
                attributes: AttributeSet::new(),
                solid: None,
                bar: None,
            }
        }

        pub fn with_attributes(mut self, records: impl IntoIterator<Item = AttributeRecord>) -> Self {
            for record in records {
                self.attributes.set(record);
            }
            self
        }
    }

    /// 内存中的图纸：元素存储与属性类型声明，供控制台宿主和测试使用。
    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    pub struct Drawing {
        elements: Vec<(ElementId, DrawingElement)>,
        next_element_id: u64,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        attribute_kinds: HashMap<AttributeId, AttributeKind>,
    }

    impl Drawing {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_element(&mut self, element: DrawingElement) -> ElementId {
            let id = self.next_id();
            self.elements.push((id, element));
            id
        }

        /// 以指定 ID 插入元素（快照加载时保持原 ID）。
        /// ID 已存在或为 `u64::MAX`（无法再分配后续 ID）时返回 `false`。
        pub fn insert_element(&mut self, id: ElementId, element: DrawingElement) -> bool {
            if self.element(id).is_some() {
                return false;
            }
            let Some(next) = id.get().checked_add(1) else {
                return false;
            };
            self.next_element_id = self.next_element_id.max(next);
            self.elements.push((id, element));
            true
        }

        pub fn add_volume(
            &mut self,
            element_type: ElementType,
            solid: Solid,
            attributes: impl IntoIterator<Item = AttributeRecord>,
        ) -> ElementId {
            let mut element = DrawingElement::new(element_type).with_attributes(attributes);
            element.solid = Some(solid);
            self.add_element(element)
        }

        pub fn add_bar_placement(
            &mut self,
            element_type: ElementType,
            mark: impl Into<String>,
            shape: Option<BarShape>,
            attributes: impl IntoIterator<Item = AttributeRecord>,
        ) -> ElementId {
            let mut element = DrawingElement::new(element_type).with_attributes(attributes);
            element.bar = Some(BarPlacement {
                mark: mark.into(),
                shape,
            });
            self.add_element(element)
        }

        #[inline]
        pub fn declare_attribute(&mut self, id: AttributeId, kind: AttributeKind) {
            self.attribute_kinds.insert(id, kind);
        }

        #[inline]
        pub fn attribute_kind(&self, id: AttributeId) -> Option<AttributeKind> {
            self.attribute_kinds.get(&id).copied()
        }

        #[inline]
        pub fn attribute_kinds(&self) -> impl Iterator<Item = (AttributeId, AttributeKind)> + '_ {
            self.attribute_kinds.iter().map(|(id, kind)| (*id, *kind))
        }

        #[inline]
        pub fn elements(&self) -> impl Iterator<Item = &(ElementId, DrawingElement)> {
            self.elements.iter()
        }

        #[inline]
        pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
            self.elements.iter().map(|(id, _)| *id)
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.elements.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.elements.is_empty()
        }

        #[inline]
        pub fn element(&self, id: ElementId) -> Option<&DrawingElement> {
            self.elements
                .iter()
                .find_map(|(element_id, element)| (*element_id == id).then_some(element))
        }

        #[inline]
        pub fn element_mut(&mut self, id: ElementId) -> Option<&mut DrawingElement> {
            self.elements
                .iter_mut()
                .find_map(|(element_id, element)| (*element_id == id).then_some(element))
        }

        #[inline]
        fn next_id(&mut self) -> ElementId {
            let id = self.next_element_id;
            self.next_element_id = self.next_element_id.saturating_add(1);
            ElementId(id)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn drawing_assigns_sequential_ids() {
            let mut drawing = Drawing::new();
            let slab = drawing.add_volume(
                ElementType::Slab,
                Solid::cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)),
                [AttributeRecord::text(10, "S-01")],
            );
            let bar = drawing.add_bar_placement(ElementType::BarsLinearPlacement, "3", None, []);
            assert_eq!(slab.get(), 0);
            assert_eq!(bar.get(), 1);
            assert_eq!(drawing.len(), 2);
            let attrs = &drawing.element(slab).unwrap().attributes;
            assert_eq!(
                attrs.get(AttributeId::new(10)).unwrap().value.as_text(),
                Some("S-01")
            );
            assert_eq!(drawing.element(bar).unwrap().bar.as_ref().unwrap().mark, "3");
        }

        #[test]
        fn insert_element_keeps_id_and_advances_counter() {
            let mut drawing = Drawing::new();
            assert!(drawing.insert_element(ElementId::new(7), DrawingElement::new(ElementType::Beam)));
            assert!(!drawing.insert_element(ElementId::new(7), DrawingElement::new(ElementType::Beam)));
            let next = drawing.add_element(DrawingElement::new(ElementType::Column));
            assert_eq!(next.get(), 8);
        }

        #[test]
        fn insert_element_rejects_id_without_successor() {
            let mut drawing = Drawing::new();
            assert!(!drawing.insert_element(ElementId::new(u64::MAX), DrawingElement::new(ElementType::Beam)));
            assert!(drawing.is_empty());

            let last = ElementId::new(u64::MAX - 1);
            assert!(drawing.insert_element(last, DrawingElement::new(ElementType::Beam)));
            let next = drawing.add_element(DrawingElement::new(ElementType::Column));
            assert_eq!(next.get(), u64::MAX);
        }
    }
}
