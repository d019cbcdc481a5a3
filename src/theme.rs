use ratatui::style::Color;

/// Semantic color slots the renderer maps cell classes onto.
#[derive(Debug, Clone)]
pub struct Theme {
    pub fg: Color,
    pub bg: Color,
    pub muted: Color,
    pub frame: Color,
    pub sel_bg: Color,
    pub sel_fg: Color,
    pub up: Color,
    pub down: Color,
    pub accent: Color,
    pub input: Color,
    pub title: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        dark()
    }
}

pub fn by_name(name: &str) -> Theme {
    match name {
        "dark" => dark(),
        "light" => light(),
        "solarized-dark" => solarized_dark(),
        "ocean" => ocean(),
        "mono" => mono(),
        _ => dark(),
    }
}

pub fn dark() -> Theme {
    Theme {
        fg: Color::Indexed(253),
        bg: Color::Reset,
        muted: Color::Indexed(243),
        frame: Color::Indexed(240),
        sel_bg: Color::Indexed(237),
        sel_fg: Color::Indexed(255),
        up: Color::Indexed(46),
        down: Color::Indexed(196),
        accent: Color::Indexed(81),
        input: Color::Indexed(220),
        title: Color::Indexed(255),
        error: Color::Indexed(196),
    }
}

pub fn light() -> Theme {
    Theme {
        fg: Color::Indexed(234),
        bg: Color::Indexed(231),
        muted: Color::Indexed(246),
        frame: Color::Indexed(251),
        sel_bg: Color::Indexed(253),
        sel_fg: Color::Indexed(232),
        up: Color::Indexed(28),
        down: Color::Indexed(124),
        accent: Color::Indexed(25),
        input: Color::Indexed(130),
        title: Color::Indexed(232),
        error: Color::Indexed(124),
    }
}

pub fn solarized_dark() -> Theme {
    // base0 #839496, base01 #586e75, green #859900, red #dc322f,
    // cyan #2aa198, yellow #b58900, blue #268bd2, orange #cb4b16
    Theme {
        fg: Color::Indexed(246),
        bg: Color::Reset,
        muted: Color::Indexed(240),
        frame: Color::Indexed(23),
        sel_bg: Color::Indexed(23),
        sel_fg: Color::Indexed(230),
        up: Color::Indexed(64),
        down: Color::Indexed(160),
        accent: Color::Indexed(37),
        input: Color::Indexed(136),
        title: Color::Indexed(33),
        error: Color::Indexed(166),
    }
}

pub fn ocean() -> Theme {
    Theme {
        fg: Color::Indexed(153),
        bg: Color::Reset,
        muted: Color::Indexed(60),
        frame: Color::Indexed(24),
        sel_bg: Color::Indexed(17),
        sel_fg: Color::Indexed(231),
        up: Color::Indexed(49),
        down: Color::Indexed(203),
        accent: Color::Indexed(39),
        input: Color::Indexed(117),
        title: Color::Indexed(75),
        error: Color::Indexed(203),
    }
}

pub fn mono() -> Theme {
    Theme {
        fg: Color::Reset,
        bg: Color::Reset,
        muted: Color::Reset,
        frame: Color::Reset,
        sel_bg: Color::Reset,
        sel_fg: Color::Reset,
        up: Color::Reset,
        down: Color::Reset,
        accent: Color::Reset,
        input: Color::Reset,
        title: Color::Reset,
        error: Color::Reset,
    }
}
