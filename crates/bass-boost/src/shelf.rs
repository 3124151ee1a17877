use core::f32::consts::PI;

/// Shelf slope. At 1.0 the transition is as steep as it can be without a
/// bump in the magnitude response.
const SHELF_SLOPE: f32 = 1.0;

/// Biquad coefficients normalized by `a0`, so the recurrence reads
/// `y[n] = b0 x[n] + b1 x[n-1] + b2 x[n-2] - a1 y[n-1] - a2 y[n-2]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Coefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl Coefficients {
    /// Robert Bristow-Johnson low-shelf design.
    pub fn low_shelf(gain_db: f32, cutoff_hz: f32, sample_rate_hz: f32) -> Self {
        let a = libm::powf(10.0, gain_db / 40.0);
        let omega = 2.0 * PI * cutoff_hz / sample_rate_hz;
        let cos_w = libm::cosf(omega);
        let sin_w = libm::sinf(omega);
        let alpha = sin_w / 2.0
            * libm::sqrtf((a + 1.0 / a) * (1.0 / SHELF_SLOPE - 1.0) + 2.0);
        let k = 2.0 * libm::sqrtf(a) * alpha;

        let a0 = (a + 1.0) + (a - 1.0) * cos_w + k;
        let a1 = -2.0 * ((a - 1.0) + (a + 1.0) * cos_w);
        let a2 = (a + 1.0) + (a - 1.0) * cos_w - k;
        let b0 = a * ((a + 1.0) - (a - 1.0) * cos_w + k);
        let b1 = 2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w);
        let b2 = a * ((a + 1.0) - (a - 1.0) * cos_w - k);

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Magnitude at 0 Hz. For a low shelf this is the linear amplitude gain
    /// of the shelf, `10^(gain_db / 20)`.
    pub fn dc_gain(&self) -> f32 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }
}

/// Two input and two output history samples of one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelState {
    pub x1: f32,
    pub x2: f32,
    pub y1: f32,
    pub y2: f32,
}

impl ChannelState {
    /// Run one normalized sample through the difference equation.
    ///
    /// The unclamped output is kept as history.
    #[inline]
    pub fn step(&mut self, c: &Coefficients, x: f32) -> f32 {
        let y = c.b0 * x + c.b1 * self.x1 + c.b2 * self.x2
            - c.a1 * self.y1
            - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}
