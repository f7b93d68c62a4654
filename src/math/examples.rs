use crate::renderer::scene::Rgb;

pub struct FormulaExample {
    pub name: &'static str,
    pub description: &'static str,
    pub formula: &'static str,
    pub color: Rgb,
}

pub const FORMULA_EXAMPLES: &[FormulaExample] = &[
    FormulaExample {
        name: "Paraboloid",
        description: "Bowl opening upward",
        formula: "x^2 + y^2",
        color: Rgb::new(84, 102, 206),
    },
    FormulaExample {
        name: "Saddle",
        description: "x² - y²",
        formula: "x^2 - y^2",
        color: Rgb::new(172, 117, 35),
    },
    FormulaExample {
        name: "Sine Wave",
        description: "Sum of two sine waves",
        formula: "sin(x) + sin(y)",
        color: Rgb::new(46, 172, 35),
    },
    FormulaExample {
        name: "Ripple",
        description: "Radial wave pattern",
        formula: "sin(sqrt(x*x + y*y))",
        color: Rgb::new(131, 23, 213),
    },
    FormulaExample {
        name: "Egg Crate",
        description: "Product of cosines, written as an assignment",
        formula: "z = cos(x) * cos(y)",
        color: Rgb::new(220, 220, 225),
    },
    FormulaExample {
        name: "Gaussian",
        description: "Single bump centred on the origin",
        formula: "8 * exp(0 - (x*x + y*y) / 16)",
        color: Rgb::new(172, 35, 35),
    },
    FormulaExample {
        name: "Spiral Ramp",
        description: "Angle around the origin",
        formula: "atan2(y x)",
        color: Rgb::new(35, 160, 172),
    },
    FormulaExample {
        name: "Plane",
        description: "Tilted plane",
        formula: "x / 4 + y / 2",
        color: Rgb::new(107, 107, 112),
    },
];

pub fn find_example(name: &str) -> Option<&'static FormulaExample> {
    FORMULA_EXAMPLES
        .iter()
        .find(|ex| ex.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Formula;

    #[test]
    fn every_example_compiles_and_evaluates() {
        for ex in FORMULA_EXAMPLES {
            let formula = Formula::compile(ex.formula)
                .unwrap_or_else(|e| panic!("{} does not compile: {e}", ex.name));
            let z = formula
                .eval(1.5, -0.5)
                .unwrap_or_else(|e| panic!("{} does not evaluate: {e}", ex.name));
            assert!(z.is_finite(), "{} is not finite", ex.name);
        }
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(find_example("saddle").map(|ex| ex.formula), Some("x^2 - y^2"));
        assert!(find_example("torus").is_none());
    }
}
