//! The scrolling site page.
//!
//! Blocks are laid out top to bottom, one row per line, so a block's top row
//! is known up front and the assistant can scroll to it by id.

use std::sync::{Arc, Mutex, MutexGuard};

use lucosms_core::{PageSurface, ScrollRequest, SectionId};

/// Rows kept visible above a section when the assistant scrolls to it.
pub const PAGE_HEADER_OFFSET: u32 = 1;

/// Fraction of the remaining distance covered per tick while smooth scrolling.
const SMOOTH_SCROLL_DIVISOR: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row<'a> {
    Title(&'a str),
    Body(&'a str),
    Blank,
}

#[derive(Debug, Clone)]
pub struct PageBlock {
    pub id: Option<SectionId>,
    pub title: &'static str,
    pub lines: Vec<&'static str>,
}

impl PageBlock {
    fn new(id: Option<SectionId>, title: &'static str, lines: Vec<&'static str>) -> Self {
        Self { id, title, lines }
    }

    /// Title, body, and one trailing blank row.
    fn height(&self) -> u32 {
        self.lines.len() as u32 + 2
    }
}

#[derive(Debug)]
pub struct Page {
    blocks: Vec<PageBlock>,
    tops: Vec<u32>,
    total_rows: u32,
    scroll: u32,
    target: Option<u32>,
    viewport_height: u32,
}

impl Page {
    pub fn new(blocks: Vec<PageBlock>) -> Self {
        let mut tops = Vec::with_capacity(blocks.len());
        let mut row = 0;
        for block in &blocks {
            tops.push(row);
            row += block.height();
        }

        Self {
            blocks,
            tops,
            total_rows: row,
            scroll: 0,
            target: None,
            viewport_height: 0,
        }
    }

    /// The LUCOSMS landing page.
    pub fn site() -> Self {
        Self::new(site_blocks())
    }

    pub fn rows(&self) -> Vec<Row<'_>> {
        let mut rows = Vec::with_capacity(self.total_rows as usize);
        for block in &self.blocks {
            rows.push(Row::Title(block.title));
            rows.extend(block.lines.iter().map(|line| Row::Body(line)));
            rows.push(Row::Blank);
        }
        rows
    }

    pub fn scroll(&self) -> u32 {
        self.scroll
    }

    pub fn is_animating(&self) -> bool {
        self.target.is_some()
    }

    pub fn max_scroll(&self) -> u32 {
        self.total_rows.saturating_sub(self.viewport_height)
    }

    pub fn set_viewport_height(&mut self, height: u16) {
        self.viewport_height = height as u32;
        self.scroll = self.scroll.min(self.max_scroll());
        if let Some(target) = self.target {
            self.target = Some(target.min(self.max_scroll()));
        }
    }

    pub fn viewport_height(&self) -> u32 {
        self.viewport_height
    }

    /// Manual scrolling; cancels any smooth scroll in progress.
    pub fn scroll_by(&mut self, delta: i32) {
        self.target = None;
        let next = self.scroll as i64 + delta as i64;
        self.scroll = next.clamp(0, self.max_scroll() as i64) as u32;
    }

    pub fn scroll_to_top(&mut self) {
        self.target = None;
        self.scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.target = None;
        self.scroll = self.max_scroll();
    }

    /// Advance a smooth scroll one step toward its target.
    pub fn tick(&mut self) {
        let Some(target) = self.target else {
            return;
        };

        let distance = target.abs_diff(self.scroll);
        let step = (distance / SMOOTH_SCROLL_DIVISOR).max(1).min(distance);
        if target > self.scroll {
            self.scroll += step;
        } else {
            self.scroll -= step;
        }

        if self.scroll == target {
            self.target = None;
        }
    }

    /// Id of the section the viewport is currently showing.
    pub fn current_section(&self) -> Option<SectionId> {
        let anchor_row = self.scroll + PAGE_HEADER_OFFSET;
        self.blocks
            .iter()
            .zip(&self.tops)
            .filter(|(_, top)| **top <= anchor_row)
            .filter_map(|(block, _)| block.id)
            .last()
    }
}

impl PageSurface for Page {
    fn locate(&self, section_id: &str) -> Option<u32> {
        self.blocks
            .iter()
            .zip(&self.tops)
            .find(|(block, _)| block.id.map(|id| id.as_str()) == Some(section_id))
            .map(|(_, top)| *top)
    }

    fn scroll_to(&mut self, request: ScrollRequest) {
        let top = request.top.min(self.max_scroll());
        if request.smooth {
            self.target = Some(top);
        } else {
            self.target = None;
            self.scroll = top;
        }
    }

    fn header_offset(&self) -> u32 {
        PAGE_HEADER_OFFSET
    }
}

/// The page shared between the UI loop and a running exchange.
#[derive(Clone)]
pub struct SharedPage(Arc<Mutex<Page>>);

impl SharedPage {
    pub fn new(page: Page) -> Self {
        Self(Arc::new(Mutex::new(page)))
    }

    pub fn lock(&self) -> MutexGuard<'_, Page> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PageSurface for SharedPage {
    fn locate(&self, section_id: &str) -> Option<u32> {
        self.lock().locate(section_id)
    }

    fn scroll_to(&mut self, request: ScrollRequest) {
        self.lock().scroll_to(request)
    }

    fn header_offset(&self) -> u32 {
        self.lock().header_offset()
    }
}

fn site_blocks() -> Vec<PageBlock> {
    vec![
        PageBlock::new(
            Some(SectionId::Hero),
            "Great minds are Limitless",
            vec![
                "Premium bulk SMS for Uganda. Reach every customer, on every network, in seconds.",
                "",
                "Messaging Ecosystem",
                "  Auto Bills          Utility payments over SMS",
                "  WhatsApp Connect    Business API messaging",
                "  Mobile Pay          Disbursements to mobile money",
                "  Airtime & Data      Instant top-ups",
            ],
        ),
        PageBlock::new(
            Some(SectionId::Customers),
            "Trusted by 10,000+ growing businesses",
            vec![
                "1M+ Messages Sent   100% Uganda Coverage   50+ Happy Clients   10+ Partner Schools",
                "",
                "Shopify  HubSpot  Zapier  Linear  Notion  Intercom  Stripe  Vercel",
                "",
                "\"LUCOSMS transformed our customer engagement. The API is a dream to work with.\"",
                "    Brian Trends",
                "\"We switched from Twilio and saved 40% while getting better support.\"",
                "    Npp Secondary School",
                "\"The segmentation features helped us double our conversion rates.\"",
                "    Ben Nakimanya",
            ],
        ),
        PageBlock::new(
            Some(SectionId::Code),
            "Built for developers",
            vec![
                "import { LucoSMS } from '@lucosms/sdk';",
                "",
                "const client = new LucoSMS(process.env.API_KEY);",
                "",
                "await client.messages.send({",
                "  to: '+15550109988',",
                "  from: 'LUCO',",
                "  text: 'Your one-time code is: 4829',",
                "});",
            ],
        ),
        PageBlock::new(
            Some(SectionId::Features),
            "Everything you need to scale",
            vec![
                "Lightning Delivery     Direct carrier connections land messages in seconds.",
                "Advanced Analytics     Real-time delivery reports, open rates, click-throughs.",
                "Smart Segmentation     Target by behavior, location, and purchase history.",
                "Developer API          REST API with SDKs for Node, Python, PHP, and Go.",
                "99.99% Uptime SLA      Redundant pathways so your business never stops.",
                "Bank-Grade Security    SOC 2 Type II, end-to-end encryption, enforced 2FA.",
            ],
        ),
        PageBlock::new(
            None,
            "Uganda & Beyond",
            vec![
                "Live Network Status: all carriers operational",
                "Success Rate and Avg. Net Latency tracked in real time",
                "Enterprise-Grade Redundancy across Tier 1 carrier routes",
            ],
        ),
        PageBlock::new(
            Some(SectionId::Pricing),
            "Simple, transparent pricing (UGX per SMS)",
            vec![
                "Basic        35 UGX   Pay-as-you-go, Web Dashboard, Basic Analytics",
                "Standard     32 UGX   Priority Routes, Sender ID, Sub-accounts   [Popular]",
                "Enterprise   30 UGX   Dedicated Support, SMPP, Custom SLA",
            ],
        ),
        PageBlock::new(
            None,
            "Frequently asked questions",
            vec![
                "How do I pay for SMS credits?",
                "  Mobile Money (MTN MoMo, Airtel Money) and bank transfers, credited instantly.",
                "Do my SMS credits expire?",
                "  No, never. Credits have lifetime validity.",
                "Can I use a custom Sender ID?",
                "  Yes. Registration typically takes 24-48 hours for telecom approval.",
                "Is there a setup fee or monthly subscription?",
                "  No setup fees and no subscriptions on Basic and Standard plans.",
                "Do you support API integration?",
                "  REST API, SMPP, and SDKs for Node.js, PHP, Python, and Java.",
                "What is the delivery rate?",
                "  99.9%, with real-time delivery reports for every message.",
            ],
        ),
        PageBlock::new(
            Some(SectionId::Newsletter),
            "System Updates",
            vec![
                "Subscribe for product news and network status updates.",
                "Contact: +256 772 123 456 / +256 701 987 654 / admin@lucosms.ug",
            ],
        ),
    ]
}
