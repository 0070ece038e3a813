// ==========================================
// 集成测试辅助 - 材料构造器
// ==========================================

use labpack_engine::domain::material::{ComponentEntry, FlashPoint};
use labpack_engine::{MaterialRecord, PhysicalState};

/// 测试用 MaterialRecord 构造器
pub struct MaterialBuilder {
    record: MaterialRecord,
}

impl MaterialBuilder {
    pub fn new(material_id: &str, product_name: &str) -> Self {
        Self {
            record: MaterialRecord {
                material_id: material_id.to_string(),
                product_name: product_name.to_string(),
                physical_state: PhysicalState::Liquid,
                ph: None,
                flash_point: None,
                dot_hazard_class: None,
                un_number: None,
                waste_codes: vec![],
                composition: vec![],
                volume_l: Some(4.0),
                weight_kg: Some(3.5),
            },
        }
    }

    pub fn state(mut self, state: PhysicalState) -> Self {
        self.record.physical_state = state;
        self
    }

    pub fn ph(mut self, ph: f64) -> Self {
        self.record.ph = Some(ph);
        self
    }

    pub fn flash_point_c(mut self, celsius: f64) -> Self {
        self.record.flash_point = Some(FlashPoint::from_celsius(celsius));
        self
    }

    pub fn dot_class(mut self, class: &str) -> Self {
        self.record.dot_hazard_class = Some(class.to_string());
        self
    }

    pub fn un_number(mut self, un: &str) -> Self {
        self.record.un_number = Some(un.to_string());
        self
    }

    pub fn waste_codes(mut self, codes: &[&str]) -> Self {
        self.record.waste_codes = codes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn component(mut self, name: &str, cas: Option<&str>, percentage: Option<f64>) -> Self {
        self.record.composition.push(ComponentEntry {
            name: name.to_string(),
            cas_number: cas.map(String::from),
            percentage,
        });
        self
    }

    pub fn volume_l(mut self, volume: f64) -> Self {
        self.record.volume_l = Some(volume);
        self
    }

    pub fn no_volume(mut self) -> Self {
        self.record.volume_l = None;
        self
    }

    pub fn weight_kg(mut self, weight: f64) -> Self {
        self.record.weight_kg = Some(weight);
        self
    }

    pub fn build(self) -> MaterialRecord {
        self.record
    }
}
